use pmis_core::error::CoreError;
use pmis_core::wizard::SubmitBlocked;

/// Fallback shown when a failure carries no message fit for the user.
const GENERIC_FAILURE: &str = "Something went wrong while talking to the server. Please try again.";

/// Errors from the client layer: remote calls, configuration, and the
/// submission gate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A response body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Session has ended")]
    SessionEnded,

    #[error(transparent)]
    Blocked(#[from] SubmitBlocked),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ClientError {
    /// Text suitable for a notification toast.
    ///
    /// Backend messages are passed through verbatim; transport failures fall
    /// back to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::SessionEnded => {
                "Your session has expired. Please log in again.".to_string()
            }
            ClientError::Blocked(e) => e.to_string(),
            ClientError::Core(CoreError::Validation(msg) | CoreError::Conflict(msg)) => {
                msg.clone()
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}
