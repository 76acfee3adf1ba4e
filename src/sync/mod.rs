//! Device state synchronization
//!
//! - `synchronizer`: the task that owns the device mirror, its timers and all writes
//! - `timer`: one-shot retry timer and per-control debounce
//!
//! Callers talk to the task through a cloneable [`SyncHandle`]; state is
//! observed through a watch channel and toasts through an mpsc receiver.

mod synchronizer;
pub mod timer;

pub use synchronizer::DeviceSynchronizer;

use tokio::sync::{mpsc, watch};

use crate::error::SyncStopped;
use crate::models::{DeviceConfig, LedRequest, Rgb, StripEdit};

const COMMAND_BUFFER: usize = 64;

/// Connection indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Disconnected,
    Connected,
}

impl Connection {
    pub fn is_connected(&self) -> bool {
        matches!(self, Connection::Connected)
    }
}

/// Everything the synchronizer publishes to views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    pub config: DeviceConfig,
    pub connection: Connection,
    /// Last reported free heap in bytes
    pub free_heap: Option<u32>,
    /// Slider position; leads `config.brightness` while a write is debounced
    pub brightness_preview: u8,
    /// Incremented on every successful config load
    pub config_revision: u64,
}

impl Default for PanelState {
    fn default() -> Self {
        let config = DeviceConfig::default();
        Self {
            brightness_preview: config.brightness,
            config,
            connection: Connection::Disconnected,
            free_heap: None,
            config_revision: 0,
        }
    }
}

#[derive(Debug)]
enum Command {
    Reload,
    SaveConfig(Vec<StripEdit>),
    SetMode(u8),
    SetBrightness(u8),
    SetColor(Rgb),
    SetSingleLed(LedRequest),
    UpdateStripCount { index: usize, count: u16 },
}

/// Cloneable handle to a running [`DeviceSynchronizer`]
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PanelState>,
}

impl SyncHandle {
    async fn send(&self, command: Command) -> Result<(), SyncStopped> {
        self.commands.send(command).await.map_err(|_| SyncStopped)
    }

    /// Re-read the full configuration from the device
    pub async fn reload(&self) -> Result<(), SyncStopped> {
        self.send(Command::Reload).await
    }

    /// Submit edited strip cards; pins are taken from the mirror by position
    pub async fn save_config(&self, edits: Vec<StripEdit>) -> Result<(), SyncStopped> {
        self.send(Command::SaveConfig(edits)).await
    }

    pub async fn set_mode(&self, mode: u8) -> Result<(), SyncStopped> {
        self.send(Command::SetMode(mode)).await
    }

    /// Debounced brightness write; the preview updates immediately
    pub async fn set_brightness(&self, brightness: u8) -> Result<(), SyncStopped> {
        self.send(Command::SetBrightness(brightness)).await
    }

    pub async fn set_color(&self, color: Rgb) -> Result<(), SyncStopped> {
        self.send(Command::SetColor(color)).await
    }

    pub async fn set_single_led(&self, strip: u8, led: u16, color: Rgb) -> Result<(), SyncStopped> {
        self.send(Command::SetSingleLed(LedRequest { strip, led, color }))
            .await
    }

    /// Local-only edit of a strip's LED count
    pub async fn update_strip_count(&self, index: usize, count: u16) -> Result<(), SyncStopped> {
        self.send(Command::UpdateStripCount { index, count }).await
    }

    /// Snapshot of the current published state
    pub fn state(&self) -> PanelState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::time::{timeout, Duration};

    use crate::client::{DeviceApi, HttpDeviceClient};
    use crate::config::{DeviceSettings, EmulatorSettings, SyncSettings};
    use crate::emulator::{self, EmulatorState};
    use crate::models::{StripConfig, MANUAL_MODE};
    use crate::notify::Toast;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_round_trip_against_emulator() {
        let emulated = EmulatorState::new(&EmulatorSettings::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = emulator::router(emulated.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = HttpDeviceClient::new(&DeviceSettings {
            base_url: format!("http://{}", addr),
            ..Default::default()
        })
        .unwrap();
        let api: Arc<dyn DeviceApi> = Arc::new(client);
        let settings = SyncSettings {
            poll_interval_ms: 100,
            retry_delay_ms: 50,
            brightness_debounce_ms: 20,
        };
        let (handle, mut notifications, _task) = DeviceSynchronizer::spawn(api, settings);
        let mut state_rx = handle.subscribe();

        timeout(WAIT, state_rx.wait_for(|s| s.config_revision == 1))
            .await
            .unwrap()
            .unwrap();

        let edits = vec![
            StripEdit::new(false, 10),
            StripEdit::new(true, 20),
            StripEdit::new(true, 30),
            StripEdit::new(false, 40),
        ];
        handle.save_config(edits).await.unwrap();

        let state = timeout(WAIT, state_rx.wait_for(|s| s.config_revision == 2))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert_eq!(
            state.config.strips,
            vec![
                StripConfig { pin: 16, led_count: 10, enabled: false },
                StripConfig { pin: 17, led_count: 20, enabled: true },
                StripConfig { pin: 18, led_count: 30, enabled: true },
                StripConfig { pin: 19, led_count: 40, enabled: false },
            ]
        );
        assert_eq!(
            timeout(WAIT, notifications.recv()).await.unwrap().unwrap().toast,
            Toast::ConfigSaved
        );

        handle.set_mode(MANUAL_MODE).await.unwrap();
        handle.set_single_led(1, 19, Rgb::new(9, 8, 7)).await.unwrap();
        assert_eq!(
            timeout(WAIT, notifications.recv()).await.unwrap().unwrap().toast,
            Toast::LedUpdated { strip: 1, led: 19 }
        );
        assert_eq!(
            emulated.device.read().await.pixels.get(&(1, 19)),
            Some(&Rgb::new(9, 8, 7))
        );
        assert!(handle.state().config.manual_mode);
    }
}
