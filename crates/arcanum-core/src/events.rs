//! Process-wide event hub.
//!
//! Cross-cutting signals (session invalidation, user notifications,
//! analytics, navigation requests) travel over explicit broadcast channels
//! owned by a single hub that is injected into the components that emit or
//! observe them. Every channel is fire-and-forget: zero or more listeners,
//! and send failures (no receivers) are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A user-facing notification (rendered as a toast by the presentation
/// layer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// A fire-and-forget telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

/// The hub owning every cross-cutting channel.
pub struct EventHub {
    invalidation: broadcast::Sender<()>,
    notifications: broadcast::Sender<Notification>,
    analytics: broadcast::Sender<AnalyticsEvent>,
    navigation: broadcast::Sender<String>,
}

impl EventHub {
    /// Creates a hub with default channel capacity.
    pub fn new() -> Self {
        Self {
            invalidation: broadcast::channel(CHANNEL_CAPACITY).0,
            notifications: broadcast::channel(CHANNEL_CAPACITY).0,
            analytics: broadcast::channel(CHANNEL_CAPACITY).0,
            navigation: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    /// Broadcasts the session-invalidation signal (e.g. after a 401 or an
    /// explicit logout).
    pub fn broadcast_invalidation(&self) {
        let _ = self.invalidation.send(());
    }

    /// Subscribes to session-invalidation signals.
    pub fn subscribe_invalidation(&self) -> broadcast::Receiver<()> {
        self.invalidation.subscribe()
    }

    /// Emits a user-facing notification.
    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification {
            kind,
            message: message.into(),
        };

        match kind {
            NotificationKind::Error => tracing::warn!("[notify] {}", notification.message),
            _ => tracing::debug!("[notify] {}", notification.message),
        }

        let _ = self.notifications.send(notification);
    }

    /// Emits an error notification.
    pub fn notify_error(&self, message: impl Into<String>) {
        self.notify(NotificationKind::Error, message);
    }

    /// Emits a success notification.
    pub fn notify_success(&self, message: impl Into<String>) {
        self.notify(NotificationKind::Success, message);
    }

    /// Emits an info notification.
    pub fn notify_info(&self, message: impl Into<String>) {
        self.notify(NotificationKind::Info, message);
    }

    /// Subscribes to user-facing notifications.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Emits a telemetry event.
    pub fn track(&self, event: impl Into<String>, payload: Option<Map<String, Value>>) {
        let _ = self.analytics.send(AnalyticsEvent {
            event: event.into(),
            payload,
        });
    }

    /// Subscribes to telemetry events.
    pub fn subscribe_analytics(&self) -> broadcast::Receiver<AnalyticsEvent> {
        self.analytics.subscribe()
    }

    /// Requests navigation to a route (e.g. the login page after a 401).
    pub fn navigate(&self, target: impl Into<String>) {
        let _ = self.navigation.send(target.into());
    }

    /// Subscribes to navigation requests.
    pub fn subscribe_navigation(&self) -> broadcast::Receiver<String> {
        self.navigation.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
