//! Shared fakes for wizard session integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pmis_client::error::ClientError;
use pmis_client::session::{Credentials, Session};
use pmis_client::store::{ProjectStore, ReferenceSource};
use pmis_core::draft::{ProjectPayload, RefObject, StoredDonor, StoredProject};
use pmis_core::reference::{GeoTaxonomy, PickItem, ReferenceData};
use pmis_core::types::DbId;
use pmis_events::{Notification, NotificationLevel, NotificationSink};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Sink that keeps every notification for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn levels(&self) -> Vec<NotificationLevel> {
        self.seen.lock().unwrap().iter().map(|n| n.level).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.message.clone()).collect()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.levels().into_iter().filter(|l| *l == level).count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// In-memory project store. Assigns ids from 100 upward and echoes the
/// payload back as the stored project.
pub struct InMemoryStore {
    next_id: AtomicI64,
    pub saved: Mutex<Vec<(Option<DbId>, ProjectPayload)>>,
    /// When set, every call fails with this API error.
    pub reject_with: Mutex<Option<(u16, String)>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            saved: Mutex::new(Vec::new()),
            reject_with: Mutex::new(None),
        }
    }
}

impl InMemoryStore {
    pub fn rejecting(status: u16, message: &str) -> Self {
        let store = Self::default();
        *store.reject_with.lock().unwrap() = Some((status, message.to_string()));
        store
    }

    pub fn accept_again(&self) {
        *self.reject_with.lock().unwrap() = None;
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    fn save(&self, id: Option<DbId>, payload: &ProjectPayload) -> Result<StoredProject, ClientError> {
        if let Some((status, message)) = self.reject_with.lock().unwrap().clone() {
            return Err(ClientError::Api { status, message });
        }
        self.saved.lock().unwrap().push((id, payload.clone()));
        let id = id.unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(stored_from_payload(id, payload))
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn create_project(
        &self,
        _session: &Session,
        payload: &ProjectPayload,
    ) -> Result<StoredProject, ClientError> {
        self.save(None, payload)
    }

    async fn update_project(
        &self,
        _session: &Session,
        project_id: DbId,
        payload: &ProjectPayload,
    ) -> Result<StoredProject, ClientError> {
        self.save(Some(project_id), payload)
    }
}

fn stored_from_payload(id: DbId, payload: &ProjectPayload) -> StoredProject {
    StoredProject {
        id,
        name: payload.name.clone(),
        description: payload.description.clone(),
        assigned_manager: payload.assigned_manager.map(|m| RefObject {
            id: m,
            name: format!("Manager {m}"),
        }),
        budget_total: payload.budget_total,
        budget_executed: Decimal::ZERO,
        start_date: payload.start_date,
        end_date: payload.end_date,
        global_objectives: Vec::new(),
        strategic_lines: Vec::new(),
        donors: payload
            .donors
            .iter()
            .map(|d| StoredDonor {
                donor: RefObject {
                    id: d.donor,
                    name: format!("Donor {}", d.donor),
                },
                amount_contributed: d.amount_contributed,
                percentage: d.percentage,
            })
            .collect(),
        activities: Vec::new(),
        locations: payload.locations.clone(),
        evidence: Vec::new(),
        status: payload.status,
        overall_progress: payload.overall_progress,
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

pub struct StaticReferences(pub ReferenceData);

#[async_trait]
impl ReferenceSource for StaticReferences {
    async fn fetch_reference_data(&self, _session: &Session) -> Result<ReferenceData, ClientError> {
        Ok(self.0.clone())
    }
}

pub struct UnreachableReferences;

#[async_trait]
impl ReferenceSource for UnreachableReferences {
    async fn fetch_reference_data(&self, _session: &Session) -> Result<ReferenceData, ClientError> {
        Err(ClientError::Api {
            status: 503,
            message: "Service unavailable".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn reference_data() -> ReferenceData {
    ReferenceData {
        managers: vec![PickItem::new(1, "Laura Díaz")],
        global_objectives: vec![PickItem::new(10, "Food security")],
        strategic_lines: vec![PickItem::new(20, "Rural livelihoods")],
        donors: vec![PickItem::new(30, "Fund A"), PickItem::new(31, "Agency B")],
        beneficiaries: vec![PickItem::new(40, "Ana Ruiz")],
        geography: GeoTaxonomy::new()
            .with_department("Cauca", ["Popayán", "Silvia"])
            .with_department("Nariño", ["Pasto"]),
        degraded: false,
    }
}

pub fn session() -> Session {
    Session::untimed(Credentials {
        access_token: "test-token".to_string(),
        user_id: 1,
    })
}

pub fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}
