//! In-process notification bus backed by `tokio::sync::broadcast` channels.
//!
//! [`NotificationBus`] is meant to be shared via `Arc<NotificationBus>`
//! between the wizard, the session timer, and the view layer.

use tokio::sync::broadcast;

use crate::notification::{Notification, NotificationSink, SessionEvent};

/// Default buffer capacity for each broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out hub for notifications and session events.
///
/// ```rust
/// use pmis_events::{Notification, NotificationBus, NotificationSink};
///
/// let bus = NotificationBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.notify(Notification::success("Project saved"));
/// ```
#[derive(Debug)]
pub struct NotificationBus {
    notifications: broadcast::Sender<Notification>,
    sessions: broadcast::Sender<SessionEvent>,
}

impl NotificationBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When a buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (notifications, _) = broadcast::channel(capacity);
        let (sessions, _) = broadcast::channel(capacity);
        Self {
            notifications,
            sessions,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn subscribe_sessions(&self) -> broadcast::Receiver<SessionEvent> {
        self.sessions.subscribe()
    }

    /// Publish a session event. Dropped silently when nobody listens.
    pub fn publish_session(&self, event: SessionEvent) {
        // SendError only means zero receivers.
        let _ = self.sessions.send(event);
    }
}

impl NotificationSink for NotificationBus {
    fn notify(&self, notification: Notification) {
        tracing::debug!(
            level = notification.level.as_str(),
            message = %notification.message,
            "Notification published"
        );
        let _ = self.notifications.send(notification);
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
