//! Data models for the LED strip controller API

use serde::{Deserialize, Serialize};

use crate::error::ColorError;

/// Mode id that switches the device into direct per-LED addressing
pub const MANUAL_MODE: u8 = 255;

/// Upper bound of LEDs on a single strip
pub const MAX_LED_COUNT: u16 = 300;

// ============================================================================
// Device Configuration
// ============================================================================

/// One physical LED chain attached to a GPIO pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripConfig {
    pub pin: u8,
    pub led_count: u16,
    pub enabled: bool,
}

/// Full device configuration as served by `GET /api/config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    pub strips: Vec<StripConfig>,
    pub mode: u8,
    pub brightness: u8,
    pub manual_mode: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            strips: Vec::new(),
            mode: 0,
            brightness: default_brightness(),
            manual_mode: false,
        }
    }
}

fn default_brightness() -> u8 {
    100
}

impl DeviceConfig {
    /// Apply a locally chosen mode; manual mode is derived from the sentinel
    pub fn apply_mode(&mut self, mode: u8) {
        self.mode = mode;
        self.manual_mode = mode == MANUAL_MODE;
    }

    /// Sum of LEDs over enabled strips
    pub fn total_leds(&self) -> u32 {
        self.strips
            .iter()
            .filter(|s| s.enabled)
            .map(|s| u32::from(s.led_count))
            .sum()
    }

    pub fn active_strips(&self) -> usize {
        self.strips.iter().filter(|s| s.enabled).count()
    }
}

/// Lightweight status from `GET /api/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub free_heap: u32,
}

// ============================================================================
// Edits & Requests
// ============================================================================

/// Edited values of one strip card. The pin is not editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripEdit {
    pub enabled: bool,
    pub led_count: u16,
}

impl StripEdit {
    pub fn new(enabled: bool, led_count: u16) -> Self {
        Self {
            enabled,
            led_count: clamp_led_count(led_count),
        }
    }
}

impl From<&StripConfig> for StripEdit {
    fn from(strip: &StripConfig) -> Self {
        Self::new(strip.enabled, strip.led_count)
    }
}

pub fn clamp_led_count(count: u16) -> u16 {
    count.min(MAX_LED_COUNT)
}

/// Body of `POST /api/config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfigRequest {
    pub strips: Vec<StripConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BrightnessRequest {
    pub brightness: u8,
}

/// Body of `POST /api/led`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedRequest {
    pub strip: u8,
    pub led: u16,
    #[serde(flatten)]
    pub color: Rgb,
}

// ============================================================================
// Color
// ============================================================================

/// 8-bit RGB color, also the body of `POST /api/color`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorError::InvalidHex(hex.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_device_json() {
        let json = r#"{
            "strips": [
                {"pin": 16, "ledCount": 60, "enabled": true},
                {"pin": 17, "ledCount": 0, "enabled": false}
            ],
            "mode": 3,
            "brightness": 200,
            "manualMode": false
        }"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.strips.len(), 2);
        assert_eq!(config.strips[0].pin, 16);
        assert_eq!(config.strips[0].led_count, 60);
        assert!(!config.strips[1].enabled);
        assert_eq!(config.mode, 3);
        assert_eq!(config.brightness, 200);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: DeviceConfig = serde_json::from_str(r#"{"mode": 255, "manualMode": true}"#).unwrap();
        assert!(config.strips.is_empty());
        assert_eq!(config.brightness, 100);
        assert!(config.manual_mode);
    }

    #[test]
    fn test_apply_mode_derives_manual_flag() {
        let mut config = DeviceConfig::default();
        config.apply_mode(MANUAL_MODE);
        assert!(config.manual_mode);
        config.apply_mode(2);
        assert!(!config.manual_mode);
        assert_eq!(config.mode, 2);
    }

    #[test]
    fn test_stats_count_enabled_strips_only() {
        let config = DeviceConfig {
            strips: vec![
                StripConfig { pin: 16, led_count: 60, enabled: true },
                StripConfig { pin: 17, led_count: 120, enabled: false },
                StripConfig { pin: 18, led_count: 30, enabled: true },
            ],
            ..Default::default()
        };
        assert_eq!(config.total_leds(), 90);
        assert_eq!(config.active_strips(), 2);
    }

    #[test]
    fn test_strip_edit_clamps_led_count() {
        assert_eq!(StripEdit::new(true, 1000).led_count, MAX_LED_COUNT);
        assert_eq!(StripEdit::new(true, 42).led_count, 42);
    }

    #[test]
    fn test_led_request_wire_format() {
        let req = LedRequest {
            strip: 1,
            led: 7,
            color: Rgb::new(255, 0, 16),
        };
        let value = serde_json::to_value(req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"strip": 1, "led": 7, "r": 255, "g": 0, "b": 16})
        );
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgb::from_hex("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::from_hex("00FF0a").unwrap(), Rgb::new(0, 255, 10));
        assert_eq!(Rgb::new(1, 2, 255).to_hex(), "#0102ff");

        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
        assert!(Rgb::from_hex("").is_err());
    }
}
