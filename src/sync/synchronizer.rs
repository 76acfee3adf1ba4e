//! DeviceSynchronizer: single owner of the device mirror
//!
//! Runs as one tokio task. Commands, the status poll, the reconnect retry and
//! the brightness debounce are multiplexed with `select!`, and every handler
//! awaits its request inline, so no two handlers ever overlap.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::timer::{Debounce, OneShot};
use super::{Command, Connection, PanelState, SyncHandle, COMMAND_BUFFER};
use crate::client::DeviceApi;
use crate::config::SyncSettings;
use crate::models::{clamp_led_count, LedRequest, Rgb, SaveConfigRequest, StripConfig, StripEdit};
use crate::notify::{Notification, Notifier, Toast};

pub struct DeviceSynchronizer {
    api: Arc<dyn DeviceApi>,
    settings: SyncSettings,
    state: PanelState,
    state_tx: watch::Sender<PanelState>,
    notifier: Notifier,
    commands: mpsc::Receiver<Command>,
    retry: OneShot,
    brightness: Debounce<u8>,
    /// Set while an outage has already been announced
    connection_lost_notified: bool,
}

impl DeviceSynchronizer {
    pub fn new(
        api: Arc<dyn DeviceApi>,
        settings: SyncSettings,
    ) -> (Self, SyncHandle, mpsc::UnboundedReceiver<Notification>) {
        let state = PanelState::default();
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (notifier, notifications) = Notifier::new();

        let synchronizer = Self {
            api,
            settings,
            state,
            state_tx,
            notifier,
            commands: command_rx,
            retry: OneShot::new(),
            brightness: Debounce::new(settings.brightness_debounce()),
            connection_lost_notified: false,
        };
        let handle = SyncHandle {
            commands: command_tx,
            state: state_rx,
        };

        (synchronizer, handle, notifications)
    }

    /// Create a synchronizer and run it on a background task
    pub fn spawn(
        api: Arc<dyn DeviceApi>,
        settings: SyncSettings,
    ) -> (SyncHandle, mpsc::UnboundedReceiver<Notification>, JoinHandle<()>) {
        let (synchronizer, handle, notifications) = Self::new(api, settings);
        let task = tokio::spawn(synchronizer.run());
        (handle, notifications, task)
    }

    /// Run until every [`SyncHandle`] is dropped
    pub async fn run(mut self) {
        tracing::info!(
            "[Sync] Starting (poll: {}ms, retry: {}ms, debounce: {}ms)",
            self.settings.poll_interval_ms,
            self.settings.retry_delay_ms,
            self.settings.brightness_debounce_ms
        );

        self.load_config().await;

        // First tick completes immediately
        let mut poll = time::interval(self.settings.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.dispatch(command).await,
                    None => break,
                },
                _ = poll.tick() => self.poll_status().await,
                _ = self.retry.elapsed() => {
                    tracing::debug!("[Sync] Retrying config load");
                    self.load_config().await;
                }
                brightness = self.brightness.fired() => self.write_brightness(brightness).await,
            }
        }

        tracing::info!("[Sync] All handles dropped, stopping");
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::Reload => self.load_config().await,
            Command::SaveConfig(edits) => self.save_config(edits).await,
            Command::SetMode(mode) => self.set_mode(mode).await,
            Command::SetBrightness(value) => self.set_brightness(value),
            Command::SetColor(color) => self.set_color(color).await,
            Command::SetSingleLed(request) => self.set_single_led(request).await,
            Command::UpdateStripCount { index, count } => self.update_strip_count(index, count),
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Replace the mirror from the device, or schedule a retry
    async fn load_config(&mut self) {
        match self.api.fetch_config().await {
            Ok(config) => {
                tracing::debug!(
                    "[Sync] Config loaded: {} strips, mode {}",
                    config.strips.len(),
                    config.mode
                );
                if !self.brightness.is_pending() {
                    self.state.brightness_preview = config.brightness;
                }
                self.state.config = config;
                self.state.config_revision += 1;
                self.state.connection = Connection::Connected;
                self.retry.disarm();
                self.connection_lost_notified = false;
            }
            Err(e) => {
                tracing::warn!(
                    "[Sync] Failed to load config: {} (retry in {}ms)",
                    e,
                    self.settings.retry_delay_ms
                );
                self.state.connection = Connection::Disconnected;
                if !self.connection_lost_notified {
                    self.notifier.send(Toast::ConnectionLost);
                    self.connection_lost_notified = true;
                }
                self.retry.arm(self.settings.retry_delay());
            }
        }
        self.publish();
    }

    /// Status failures only flip the indicator
    async fn poll_status(&mut self) {
        match self.api.fetch_status().await {
            Ok(status) => {
                self.state.free_heap = Some(status.free_heap);
                self.state.connection = Connection::Connected;
            }
            Err(e) => {
                tracing::debug!("[Sync] Status poll failed: {}", e);
                self.state.connection = Connection::Disconnected;
            }
        }
        self.publish();
    }

    // ========================================================================
    // Writes
    // ========================================================================

    async fn save_config(&mut self, edits: Vec<StripEdit>) {
        let Some(strips) = self.rebuild_strips(&edits) else {
            tracing::warn!(
                "[Sync] Save rejected: {} edits for {} strips",
                edits.len(),
                self.state.config.strips.len()
            );
            self.notifier.send(Toast::SaveFailed);
            return;
        };

        match self.api.save_config(&SaveConfigRequest { strips }).await {
            Ok(()) => {
                tracing::info!("[Sync] Configuration saved");
                self.notifier.send(Toast::ConfigSaved);
                self.load_config().await;
            }
            Err(e) => {
                tracing::warn!("[Sync] Save failed: {}", e);
                self.notifier.send(Toast::SaveFailed);
            }
        }
    }

    /// Pair each edit with the pin of the strip at the same position
    fn rebuild_strips(&self, edits: &[StripEdit]) -> Option<Vec<StripConfig>> {
        edits
            .iter()
            .enumerate()
            .map(|(index, edit)| {
                self.state.config.strips.get(index).map(|strip| StripConfig {
                    pin: strip.pin,
                    led_count: clamp_led_count(edit.led_count),
                    enabled: edit.enabled,
                })
            })
            .collect()
    }

    async fn set_mode(&mut self, mode: u8) {
        match self.api.set_mode(mode).await {
            Ok(()) => {
                self.state.config.apply_mode(mode);
                self.publish();
            }
            Err(e) => {
                tracing::warn!("[Sync] Mode change to {} failed: {}", mode, e);
                self.notifier.send(Toast::ModeFailed);
            }
        }
    }

    fn set_brightness(&mut self, value: u8) {
        self.state.brightness_preview = value;
        self.publish();
        self.brightness.push(value);
    }

    async fn write_brightness(&mut self, value: u8) {
        match self.api.set_brightness(value).await {
            Ok(()) => {
                self.state.config.brightness = value;
            }
            Err(e) => {
                tracing::warn!("[Sync] Brightness update to {} failed: {}", value, e);
                self.notifier.send(Toast::BrightnessFailed);
                if !self.brightness.is_pending() {
                    self.state.brightness_preview = self.state.config.brightness;
                }
            }
        }
        self.publish();
    }

    async fn set_color(&mut self, color: Rgb) {
        match self.api.set_color(color).await {
            Ok(()) => self.notifier.send(Toast::ColorUpdated),
            Err(e) => {
                tracing::warn!("[Sync] Color update to {} failed: {}", color, e);
                self.notifier.send(Toast::ColorFailed);
            }
        }
    }

    async fn set_single_led(&mut self, request: LedRequest) {
        if !self.state.config.manual_mode {
            self.notifier.send(Toast::ManualModeRequired);
            return;
        }

        match self.api.set_led(&request).await {
            Ok(()) => self.notifier.send(Toast::LedUpdated {
                strip: request.strip,
                led: request.led,
            }),
            Err(e) => {
                tracing::warn!(
                    "[Sync] LED {} on strip {} update failed: {}",
                    request.led,
                    request.strip,
                    e
                );
                self.notifier.send(Toast::LedUpdateFailed);
            }
        }
    }

    fn update_strip_count(&mut self, index: usize, count: u16) {
        if let Some(strip) = self.state.config.strips.get_mut(index) {
            strip.led_count = clamp_led_count(count);
            self.publish();
        }
    }
}
