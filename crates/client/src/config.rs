use std::time::Duration;

use crate::error::ClientError;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the project REST API, without a trailing slash.
    pub api_url: String,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Minutes until a session expires (default: `60`).
    pub session_ttl_mins: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            session_ttl_mins: 60,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                     |
    /// |-----------------------------|-----------------------------|
    /// | `PMIS_API_URL`              | `http://localhost:8000/api` |
    /// | `PMIS_REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `PMIS_SESSION_TTL_MINS`     | `60`                        |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = match lookup("PMIS_API_URL") {
            Some(url) => {
                let url = url.trim().trim_end_matches('/').to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ClientError::Config(format!(
                        "PMIS_API_URL must be an http(s) URL, got '{url}'"
                    )));
                }
                url
            }
            None => defaults.api_url,
        };

        let request_timeout_secs = parse_positive(
            &lookup,
            "PMIS_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout_secs,
        )?;
        let session_ttl_mins =
            parse_positive(&lookup, "PMIS_SESSION_TTL_MINS", defaults.session_ttl_mins)?;

        Ok(Self {
            api_url,
            request_timeout_secs,
            session_ttl_mins,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_mins.saturating_mul(60))
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ClientError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
        Ok(value) => Ok(value),
    }
}
