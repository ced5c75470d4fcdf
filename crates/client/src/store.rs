//! Persistence and reference-data collaborators, plus their REST
//! implementation.
//!
//! The wizard only sees the [`ProjectStore`] and [`ReferenceSource`] traits;
//! [`RestClient`] implements both against the project backend using
//! [`reqwest`].

use async_trait::async_trait;
use pmis_core::catalog::CatalogEntry;
use pmis_core::draft::{ProjectPayload, StoredProject};
use pmis_core::reference::{GeoTaxonomy, PickItem, ReferenceData};
use pmis_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Where submitted projects are persisted.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project(
        &self,
        session: &Session,
        payload: &ProjectPayload,
    ) -> Result<StoredProject, ClientError>;

    async fn update_project(
        &self,
        session: &Session,
        project_id: DbId,
        payload: &ProjectPayload,
    ) -> Result<StoredProject, ClientError>;
}

/// Where pick-lists and the geographic taxonomy come from.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch_reference_data(&self, session: &Session) -> Result<ReferenceData, ClientError>;
}

// ---------------------------------------------------------------------------
// RestClient
// ---------------------------------------------------------------------------

/// HTTP client for the project backend.
pub struct RestClient {
    client: reqwest::Client,
    api_url: String,
}

/// A list row with an id and some display name. Users and beneficiaries
/// come back with split name fields rather than `name`.
#[derive(Debug, Deserialize)]
struct NamedRow {
    id: DbId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl From<NamedRow> for PickItem {
    fn from(row: NamedRow) -> Self {
        let full_name = [row.first_name, row.last_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let name = row
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| (!full_name.is_empty()).then_some(full_name))
            .or(row.username)
            .unwrap_or_else(|| format!("#{}", row.id));
        PickItem::new(row.id, name)
    }
}

impl RestClient {
    /// Create a client with the configured base URL and timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/", self.api_url, path.trim_matches('/'))
    }

    /// Fetch every stored project visible to the session's user.
    pub async fn list_projects(&self, session: &Session) -> Result<Vec<StoredProject>, ClientError> {
        self.get_json(session, "projects").await
    }

    /// Validate and create a catalog record (objective, line, donor, or
    /// beneficiary). Returns the backend's echo of the created record.
    pub async fn create_catalog_entry(
        &self,
        session: &Session,
        entry: &CatalogEntry,
        today: chrono::NaiveDate,
    ) -> Result<serde_json::Value, ClientError> {
        entry.validate_entry(today)?;
        let kind = entry.kind();
        // The backend takes the form fields flat, without the `kind` tag.
        let mut body = serde_json::to_value(entry)?;
        if let Some(obj) = body.as_object_mut() {
            obj.remove("kind");
        }

        let response = self
            .client
            .post(self.url(kind.endpoint()))
            .bearer_auth(session.access_token())
            .json(&body)
            .send()
            .await?;
        tracing::info!(kind = kind.as_str(), "Catalog entry submitted");
        Self::parse_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(session.access_token())
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_pick_list(&self, session: &Session, path: &str) -> Result<Vec<PickItem>, ClientError> {
        let rows: Vec<NamedRow> = self.get_json(session, path).await?;
        Ok(rows.into_iter().map(PickItem::from).collect())
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or an
    /// [`ClientError::Api`] carrying the backend's message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: api_message(&body),
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pull a readable message out of an error body.
///
/// Understands `{"detail": ..}`, `{"error": ..}`, and per-field error maps
/// (`{"name": ["This field is required."]}`). Anything else is returned
/// trimmed as-is.
pub fn api_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    let Some(obj) = value.as_object() else {
        return body.trim().to_string();
    };

    for key in ["detail", "error", "message"] {
        if let Some(msg) = obj.get(key).and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }

    let field_errors: Vec<String> = obj
        .iter()
        .filter_map(|(field, v)| {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => return None,
            };
            (!text.is_empty()).then(|| format!("{field}: {text}"))
        })
        .collect();
    if field_errors.is_empty() {
        body.trim().to_string()
    } else {
        field_errors.join("; ")
    }
}

#[async_trait]
impl ProjectStore for RestClient {
    async fn create_project(
        &self,
        session: &Session,
        payload: &ProjectPayload,
    ) -> Result<StoredProject, ClientError> {
        let response = self
            .client
            .post(self.url("projects"))
            .bearer_auth(session.access_token())
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_project(
        &self,
        session: &Session,
        project_id: DbId,
        payload: &ProjectPayload,
    ) -> Result<StoredProject, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("projects/{project_id}")))
            .bearer_auth(session.access_token())
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[async_trait]
impl ReferenceSource for RestClient {
    async fn fetch_reference_data(&self, session: &Session) -> Result<ReferenceData, ClientError> {
        let (managers, global_objectives, strategic_lines, donors, beneficiaries, geography) = tokio::try_join!(
            self.get_pick_list(session, "users/managers"),
            self.get_pick_list(session, "global-objectives"),
            self.get_pick_list(session, "strategic-lines"),
            self.get_pick_list(session, "donors"),
            self.get_pick_list(session, "beneficiaries"),
            self.get_json::<GeoTaxonomy>(session, "geography"),
        )?;

        tracing::debug!(
            managers = managers.len(),
            donors = donors.len(),
            departments = geography.departments().count(),
            "Reference data loaded"
        );

        Ok(ReferenceData {
            managers,
            global_objectives,
            strategic_lines,
            donors,
            beneficiaries,
            geography,
            degraded: false,
        })
    }
}
