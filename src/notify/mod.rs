//! Panel notifications (toasts)

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
        }
    }

    /// ANSI color used by the terminal panel
    pub fn ansi_color(&self) -> &'static str {
        match self {
            ToastKind::Success => "\x1b[32m", // Green
            ToastKind::Error => "\x1b[31m",   // Red
            ToastKind::Warning => "\x1b[33m", // Amber
        }
    }
}

/// Every user-visible notification the synchronizer can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toast {
    /// Config load failed; a retry is scheduled
    ConnectionLost,
    ConfigSaved,
    SaveFailed,
    ModeFailed,
    BrightnessFailed,
    ColorUpdated,
    ColorFailed,
    LedUpdated { strip: u8, led: u16 },
    LedUpdateFailed,
    ManualModeRequired,
}

impl Toast {
    pub fn kind(&self) -> ToastKind {
        match self {
            Toast::ConfigSaved | Toast::ColorUpdated | Toast::LedUpdated { .. } => {
                ToastKind::Success
            }
            Toast::ConnectionLost | Toast::ManualModeRequired => ToastKind::Warning,
            Toast::SaveFailed
            | Toast::ModeFailed
            | Toast::BrightnessFailed
            | Toast::ColorFailed
            | Toast::LedUpdateFailed => ToastKind::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Toast::ConnectionLost => "Connection lost. Retrying...".to_string(),
            Toast::ConfigSaved => "Configuration saved!".to_string(),
            Toast::SaveFailed => "Save failed!".to_string(),
            Toast::ModeFailed => "Mode change failed".to_string(),
            Toast::BrightnessFailed => "Brightness update failed".to_string(),
            Toast::ColorUpdated => "Color updated".to_string(),
            Toast::ColorFailed => "Color update failed".to_string(),
            Toast::LedUpdated { strip, led } => format!("LED {} on Strip {} updated", led, strip),
            Toast::LedUpdateFailed => "LED update failed".to_string(),
            Toast::ManualModeRequired => "Enable Manual Mode first".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub toast: Toast,
    pub at: DateTime<Utc>,
}

/// Sending side of the notification stream, owned by the synchronizer
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, toast: Toast) {
        match toast.kind() {
            ToastKind::Success => tracing::info!("Notify: {}", toast.message()),
            ToastKind::Error | ToastKind::Warning => {
                tracing::warn!("Notify: {}", toast.message())
            }
        }

        let notification = Notification {
            toast,
            at: Utc::now(),
        };
        // A closed receiver means nobody is displaying toasts
        let _ = self.tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_errors() {
        for toast in [
            Toast::SaveFailed,
            Toast::ModeFailed,
            Toast::BrightnessFailed,
            Toast::ColorFailed,
            Toast::LedUpdateFailed,
        ] {
            assert_eq!(toast.kind(), ToastKind::Error, "{:?}", toast);
        }
        assert_eq!(Toast::ConnectionLost.kind(), ToastKind::Warning);
        assert_eq!(Toast::ManualModeRequired.kind(), ToastKind::Warning);
    }

    #[test]
    fn test_led_message_names_strip_and_led() {
        let toast = Toast::LedUpdated { strip: 2, led: 41 };
        assert_eq!(toast.message(), "LED 41 on Strip 2 updated");
        assert_eq!(toast.kind(), ToastKind::Success);
    }

    #[tokio::test]
    async fn test_notifier_delivers_in_order() {
        let (notifier, mut rx) = Notifier::new();
        notifier.send(Toast::ConnectionLost);
        notifier.send(Toast::ConfigSaved);

        assert_eq!(rx.recv().await.unwrap().toast, Toast::ConnectionLost);
        assert_eq!(rx.recv().await.unwrap().toast, Toast::ConfigSaved);
    }

    #[test]
    fn test_send_without_receiver_is_silent() {
        let (notifier, rx) = Notifier::new();
        drop(rx);
        notifier.send(Toast::ColorUpdated);
    }
}
