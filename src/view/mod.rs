//! Panel view model
//!
//! Derives everything the panel shows from a [`PanelState`] and renders it as
//! plain text. Strip cards and mode buttons share the [`ListItem`] capability
//! so one renderer handles both lists.

use std::fmt::Write as _;

use crate::models::{clamp_led_count, DeviceConfig, StripEdit, MANUAL_MODE};
use crate::notify::Notification;
use crate::sync::PanelState;

const ANSI_RESET: &str = "\x1b[0m";

/// A renderable entry of a panel list
pub trait ListItem {
    fn label(&self) -> String;

    fn is_active(&self) -> bool;

    /// Extra text shown after the label
    fn detail(&self) -> Option<String> {
        None
    }

    fn render_line(&self) -> String {
        let marker = if self.is_active() { "[x]" } else { "[ ]" };
        match self.detail() {
            Some(detail) => format!("{} {}  {}", marker, self.label(), detail),
            None => format!("{} {}", marker, self.label()),
        }
    }
}

pub fn render_list<T: ListItem>(title: &str, items: &[T]) -> String {
    let mut out = format!("{}:\n", title);
    if items.is_empty() {
        out.push_str("  (none)\n");
    }
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", index, item.render_line());
    }
    out
}

// ============================================================================
// List items
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripCard {
    pub pin: u8,
    pub enabled: bool,
    pub led_count: u16,
}

impl ListItem for StripCard {
    fn label(&self) -> String {
        format!("GPIO {}", self.pin)
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn detail(&self) -> Option<String> {
        Some(format!("{} LEDs", self.led_count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeButton {
    pub mode: u8,
    pub active: bool,
}

impl ListItem for ModeButton {
    fn label(&self) -> String {
        if self.mode == MANUAL_MODE {
            "Manual".to_string()
        } else {
            format!("Mode {}", self.mode)
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ============================================================================
// Strip drafts
// ============================================================================

/// Unsaved strip card values; reset from the mirror on every reload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripDrafts {
    edits: Vec<StripEdit>,
    revision: u64,
}

impl StripDrafts {
    /// Reset from the mirror when a new config load has landed
    pub fn sync(&mut self, state: &PanelState) {
        if state.config_revision != self.revision {
            self.edits = state.config.strips.iter().map(StripEdit::from).collect();
            self.revision = state.config_revision;
        }
    }

    pub fn toggle(&mut self, index: usize, enabled: bool) -> bool {
        match self.edits.get_mut(index) {
            Some(edit) => {
                edit.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_count(&mut self, index: usize, count: u16) -> bool {
        match self.edits.get_mut(index) {
            Some(edit) => {
                edit.led_count = clamp_led_count(count);
                true
            }
            None => false,
        }
    }

    pub fn edits(&self) -> Vec<StripEdit> {
        self.edits.clone()
    }
}

// ============================================================================
// Panel view
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub strips: Vec<StripCard>,
    pub modes: Vec<ModeButton>,
    pub total_leds: u32,
    pub active_strips: usize,
    pub brightness_percent: u8,
    pub free_heap_kb: Option<u32>,
    pub connected: bool,
    pub manual_control_visible: bool,
}

impl PanelView {
    pub fn build(state: &PanelState, drafts: &StripDrafts, modes: &[u8]) -> Self {
        let config = &state.config;
        Self {
            strips: strip_cards(config, drafts),
            modes: modes
                .iter()
                .map(|&mode| ModeButton {
                    mode,
                    active: mode == config.mode,
                })
                .collect(),
            total_leds: config.total_leds(),
            active_strips: config.active_strips(),
            brightness_percent: brightness_percent(state.brightness_preview),
            free_heap_kb: state.free_heap.map(heap_kb),
            connected: state.connection.is_connected(),
            manual_control_visible: config.manual_mode,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let connection = if self.connected {
            "\x1b[32mConnected"
        } else {
            "\x1b[31mDisconnected"
        };
        let _ = writeln!(out, "== LED Strip Controller == {}{}", connection, ANSI_RESET);
        let _ = writeln!(
            out,
            "Total LEDs: {}  Active strips: {}  Brightness: {}%  Free heap: {}",
            self.total_leds,
            self.active_strips,
            self.brightness_percent,
            self.free_heap_kb
                .map(|kb| format!("{} KB", kb))
                .unwrap_or_else(|| "--".to_string())
        );
        out.push_str(&render_list("Strips", &self.strips));
        out.push_str(&render_list("Modes", &self.modes));
        if self.manual_control_visible {
            out.push_str("Manual control: led <strip> <led> #rrggbb\n");
        }
        out
    }
}

/// Cards take pins from the mirror and editable values from the drafts
fn strip_cards(config: &DeviceConfig, drafts: &StripDrafts) -> Vec<StripCard> {
    config
        .strips
        .iter()
        .enumerate()
        .map(|(index, strip)| {
            let edit = drafts
                .edits
                .get(index)
                .copied()
                .unwrap_or_else(|| StripEdit::from(strip));
            StripCard {
                pin: strip.pin,
                enabled: edit.enabled,
                led_count: edit.led_count,
            }
        })
        .collect()
}

pub fn brightness_percent(brightness: u8) -> u8 {
    ((u32::from(brightness) * 100 + 127) / 255) as u8
}

pub fn heap_kb(free_heap: u32) -> u32 {
    (free_heap + 512) / 1024
}

pub fn render_notification(notification: &Notification) -> String {
    let kind = notification.toast.kind();
    format!(
        "{}{} [{}] {}{}",
        kind.ansi_color(),
        notification.at.format("%H:%M:%S"),
        kind.as_str(),
        notification.toast.message(),
        ANSI_RESET
    )
}
