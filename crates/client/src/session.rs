//! Authenticated session with a cancellable expiry timer.
//!
//! Credentials travel explicitly with every collaborator call. When the
//! timer fires the session is marked ended and a
//! [`SessionEvent::Ended`] is published; nothing else is touched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pmis_core::types::DbId;
use pmis_events::{NotificationBus, SessionEndReason, SessionEvent};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub user_id: DbId,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// One logged-in user's session.
///
/// Dropping the session cancels its timer without publishing anything.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    ended: Arc<AtomicBool>,
    cancel: CancellationToken,
    bus: Option<Arc<NotificationBus>>,
}

impl Session {
    /// Start a session whose timer publishes `Ended { Expired }` on `bus`
    /// after `ttl`. Must be called inside a Tokio runtime.
    pub fn start(credentials: Credentials, ttl: Duration, bus: Arc<NotificationBus>) -> Self {
        let ended = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        tokio::spawn(run_expiry(
            credentials.user_id,
            ttl,
            cancel.clone(),
            Arc::clone(&ended),
            Arc::clone(&bus),
        ));
        tracing::info!(user_id = credentials.user_id, ttl_secs = ttl.as_secs(), "Session started");

        Self {
            credentials,
            ended,
            cancel,
            bus: Some(bus),
        }
    }

    /// [`Session::start`] with the configured time-to-live.
    pub fn from_config(
        credentials: Credentials,
        config: &ClientConfig,
        bus: Arc<NotificationBus>,
    ) -> Self {
        Self::start(credentials, config.session_ttl(), bus)
    }

    /// A session with no timer and no event publishing, for one-shot tools.
    pub fn untimed(credentials: Credentials) -> Self {
        Self {
            credentials,
            ended: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            bus: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn user_id(&self) -> DbId {
        self.credentials.user_id
    }

    pub fn access_token(&self) -> &str {
        &self.credentials.access_token
    }

    pub fn is_active(&self) -> bool {
        !self.ended.load(Ordering::SeqCst)
    }

    /// Log out: stop the timer and publish `Ended { LoggedOut }`. A second
    /// call, or a call after expiry, does nothing.
    pub fn end(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();
        tracing::info!(user_id = self.user_id(), "Session ended by logout");
        if let Some(bus) = &self.bus {
            bus.publish_session(SessionEvent::ended(
                self.user_id(),
                SessionEndReason::LoggedOut,
            ));
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_expiry(
    user_id: DbId,
    ttl: Duration,
    cancel: CancellationToken,
    ended: Arc<AtomicBool>,
    bus: Arc<NotificationBus>,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(user_id, "Session timer cancelled");
        }
        _ = tokio::time::sleep(ttl) => {
            if !ended.swap(true, Ordering::SeqCst) {
                tracing::info!(user_id, "Session expired");
                bus.publish_session(SessionEvent::ended(user_id, SessionEndReason::Expired));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn creds() -> Credentials {
        Credentials {
            access_token: "secret-token".to_string(),
            user_id: 42,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_publishes_expiry() {
        let bus = Arc::new(NotificationBus::default());
        let mut events = bus.subscribe_sessions();
        let session = Session::start(creds(), Duration::from_secs(60), Arc::clone(&bus));
        assert!(session.is_active());

        let event = events.recv().await.expect("expiry event");
        assert_matches!(
            event,
            SessionEvent::Ended {
                user_id: 42,
                reason: SessionEndReason::Expired,
                ..
            }
        );
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_cancels_timer() {
        let bus = Arc::new(NotificationBus::default());
        let mut events = bus.subscribe_sessions();
        let session = Session::start(creds(), Duration::from_secs(60), Arc::clone(&bus));

        session.end();
        session.end();

        let event = events.recv().await.expect("logout event");
        assert_matches!(
            event,
            SessionEvent::Ended {
                reason: SessionEndReason::LoggedOut,
                ..
            }
        );

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(events.try_recv().is_err());
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn configured_ttl_drives_expiry() {
        let bus = Arc::new(NotificationBus::default());
        let mut events = bus.subscribe_sessions();
        let config = ClientConfig {
            session_ttl_mins: 1,
            ..ClientConfig::default()
        };
        let session = Session::from_config(creds(), &config, Arc::clone(&bus));

        let early = tokio::time::timeout(Duration::from_secs(59), events.recv()).await;
        assert!(early.is_err());
        assert!(session.is_active());

        let event = events.recv().await.expect("expiry event");
        assert_matches!(
            event,
            SessionEvent::Ended {
                reason: SessionEndReason::Expired,
                ..
            }
        );
        assert!(!session.is_active());
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", creds());
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("42"));
    }

    #[test]
    fn untimed_session_ends_quietly() {
        let session = Session::untimed(creds());
        assert_eq!(session.access_token(), "secret-token");
        session.end();
        assert!(!session.is_active());
    }
}
