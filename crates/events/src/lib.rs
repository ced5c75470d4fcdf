//! Notification and session-event plumbing for the project wizard.
//!
//! - [`NotificationBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, carrying user-facing [`Notification`]s and
//!   [`SessionEvent`]s on separate channels.
//! - [`NotificationSink`]: the fire-and-forget seam the wizard notifies
//!   through.

pub mod bus;
pub mod notification;

pub use bus::NotificationBus;
pub use notification::{
    Notification, NotificationLevel, NotificationSink, SessionEndReason, SessionEvent,
};
