//! Outbound user notifications.
//!
//! The cart reports every outcome through a [`Notifier`]. Delivery is
//! fire-and-forget: `notify` is synchronous and must not block.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Severity of a notification, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NotifyLevel {
    Success,
    Error,
    /// An accepted change that could not be persisted.
    Critical,
}

impl std::fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Sink for user-visible messages (toasts, status lines).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, level: NotifyLevel, message: &str) {
        (**self).notify(level, message);
    }
}

/// Writes notifications to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Success => tracing::info!(%level, "{message}"),
            NotifyLevel::Error => tracing::warn!(%level, "{message}"),
            NotifyLevel::Critical => tracing::error!(%level, "{message}"),
        }
    }
}

/// A notification as delivered over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotifyLevel,
    pub message: String,
}

/// Forwards notifications to an unbounded channel for a UI layer to drain.
///
/// Sending never blocks. Once the receiver is dropped, notifications are
/// discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver that drains it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        let notification = Notification {
            level,
            message: message.to_string(),
        };
        if self.tx.send(notification).is_err() {
            tracing::debug!(%level, "Notification receiver closed, dropping message");
        }
    }
}
