//! Configuration module

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::models::MANUAL_MODE;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub emulator: EmulatorSettings,
    #[serde(default)]
    pub panel: PanelSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Timer settings of the synchronizer
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_brightness_debounce_ms")]
    pub brightness_debounce_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            brightness_debounce_ms: default_brightness_debounce_ms(),
        }
    }
}

impl SyncSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn brightness_debounce(&self) -> Duration {
        Duration::from_millis(self.brightness_debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmulatorSettings {
    #[serde(default = "default_emulator_host")]
    pub host: String,
    #[serde(default = "default_emulator_port")]
    pub port: u16,
    #[serde(default = "default_emulator_pins")]
    pub pins: Vec<u8>,
    #[serde(default = "default_emulator_led_count")]
    pub led_count: u16,
    #[serde(default = "default_emulator_free_heap")]
    pub free_heap: u32,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            host: default_emulator_host(),
            port: default_emulator_port(),
            pins: default_emulator_pins(),
            led_count: default_emulator_led_count(),
            free_heap: default_emulator_free_heap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelSettings {
    /// Mode ids offered as buttons
    #[serde(default = "default_modes")]
    pub modes: Vec<u8>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            modes: default_modes(),
        }
    }
}

fn default_base_url() -> String {
    "http://192.168.4.1".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_brightness_debounce_ms() -> u64 {
    200
}

fn default_emulator_host() -> String {
    "127.0.0.1".to_string()
}

fn default_emulator_port() -> u16 {
    8080
}

fn default_emulator_pins() -> Vec<u8> {
    vec![16, 17, 18, 19]
}

fn default_emulator_led_count() -> u16 {
    60
}

fn default_emulator_free_heap() -> u32 {
    180_000
}

fn default_modes() -> Vec<u8> {
    vec![0, 1, 2, 3, 4, 5, MANUAL_MODE]
}

impl Settings {
    /// Load from `config/default` (or `path`) and `LEDPANEL__*` environment variables
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("config/default").required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("LEDPANEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the synchronizer cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sync.poll_interval_ms == 0 {
            anyhow::bail!("sync.poll_interval_ms must be greater than zero");
        }
        Ok(())
    }
}
