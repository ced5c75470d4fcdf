//! Wizard session driver and the collaborators it talks to: the project
//! REST backend, the session with its expiry timer, and the notification
//! bus.

pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod wizard_session;

pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{Credentials, Session};
pub use store::{ProjectStore, ReferenceSource, RestClient};
pub use wizard_session::WizardSession;
