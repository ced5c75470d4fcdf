//! Project draft model, hydration from stored projects, and payload
//! serialization.
//!
//! A [`ProjectDraft`] is the working copy of one project while the wizard is
//! open. It is created empty (create flow) or hydrated from a
//! [`StoredProject`] (edit flow, foreign keys flattened to ids), mutated only
//! through [`crate::change::apply_field_change`], and finally turned into a
//! [`ProjectPayload`] for the persistence collaborator.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation;
use crate::types::{DbId, Money};

// ---------------------------------------------------------------------------
// Project status
// ---------------------------------------------------------------------------

/// Lifecycle status chosen on the final configuration step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Suspended,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Suspended => "suspended",
        }
    }
}

// ---------------------------------------------------------------------------
// Draft records
// ---------------------------------------------------------------------------

/// One donor's contribution to the project budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorAllocation {
    pub donor_ref: DbId,
    pub amount_contributed: Money,
    /// `amount_contributed / budget_total * 100`, kept in sync on every change.
    pub percentage: Decimal,
}

impl DonorAllocation {
    pub fn new(donor_ref: DbId, amount_contributed: Money) -> Self {
        Self {
            donor_ref,
            amount_contributed,
            percentage: Decimal::ZERO,
        }
    }
}

/// A budgeted activity within the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub budget_assigned: Money,
    pub percentage_of_total: Decimal,
    /// Completion in `0..=100`.
    pub progress: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub beneficiary_links: Vec<DbId>,
    pub notes: String,
}

impl Activity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            budget_assigned: Decimal::ZERO,
            percentage_of_total: Decimal::ZERO,
            progress: Decimal::ZERO,
            start_date: None,
            end_date: None,
            beneficiary_links: Vec::new(),
            notes: String::new(),
        }
    }
}

/// Geographic location where the project operates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub department: String,
    pub municipality: String,
    pub locality: String,
    /// Priority in `1..=5`.
    pub priority: u8,
}

/// Lowest (most urgent) location priority.
pub const MIN_PRIORITY: u8 = 1;

/// Highest location priority.
pub const MAX_PRIORITY: u8 = 5;

impl Location {
    pub fn is_complete(&self) -> bool {
        !self.department.trim().is_empty()
            && !self.municipality.trim().is_empty()
            && !self.locality.trim().is_empty()
    }
}

/// Where an evidence file's content lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Bytes held in memory until the multipart upload.
    Inline { bytes: Vec<u8> },
    /// Already uploaded; the backend serves it from `url`.
    Reference { url: String },
}

/// An accepted evidence file attached to the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFile {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: EvidenceSource,
}

// ---------------------------------------------------------------------------
// ProjectDraft
// ---------------------------------------------------------------------------

/// The mutable working record for one project being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    pub assigned_manager: Option<DbId>,
    /// Ceiling for every donor and activity allocation.
    pub budget_total: Money,
    /// Reported by the backend; never edited through the wizard.
    pub budget_executed: Money,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub global_objectives: Vec<DbId>,
    pub strategic_lines: Vec<DbId>,
    pub donors: Vec<DonorAllocation>,
    pub activities: Vec<Activity>,
    pub locations: Vec<Location>,
    pub evidence_files: Vec<EvidenceFile>,
    pub status: ProjectStatus,
}

impl ProjectDraft {
    /// An empty draft for the create flow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget-weighted progress across all activities, in `0..=100`.
    pub fn overall_progress(&self) -> Decimal {
        allocation::weighted_progress(&self.activities)
    }

    /// Sum of every donor's contribution.
    pub fn donor_total(&self) -> Money {
        allocation::allocated_sum(self.donors.iter().map(|d| d.amount_contributed))
    }

    /// Sum of every activity's assigned budget.
    pub fn activity_total(&self) -> Money {
        allocation::allocated_sum(self.activities.iter().map(|a| a.budget_assigned))
    }

    /// Budget not yet assigned to activities. Negative on over-allocation.
    pub fn unassigned_budget(&self) -> Money {
        allocation::remaining(
            self.budget_total,
            self.activities.iter().map(|a| a.budget_assigned),
        )
    }

    /// Recompute every derived percentage from the current amounts.
    pub(crate) fn recompute_percentages(&mut self) {
        let total = self.budget_total;
        for donor in &mut self.donors {
            donor.percentage = allocation::percentage_of(donor.amount_contributed, total);
        }
        for activity in &mut self.activities {
            activity.percentage_of_total =
                allocation::percentage_of(activity.budget_assigned, total);
        }
    }

    /// Build a draft from a persisted project, flattening nested foreign-key
    /// objects to their ids. Collection order is preserved.
    ///
    /// Stored percentages are kept when they agree with the amounts, so a
    /// hydrated project re-serializes with the same figures. Missing or stale
    /// ones are derived again.
    pub fn hydrate(stored: &StoredProject) -> Self {
        let total = stored.budget_total;
        Self {
            name: stored.name.clone(),
            description: stored.description.clone(),
            assigned_manager: stored.assigned_manager.as_ref().map(|m| m.id),
            budget_total: stored.budget_total,
            budget_executed: stored.budget_executed,
            start_date: stored.start_date,
            end_date: stored.end_date,
            global_objectives: stored.global_objectives.iter().map(|o| o.id).collect(),
            strategic_lines: stored.strategic_lines.iter().map(|l| l.id).collect(),
            donors: stored
                .donors
                .iter()
                .map(|d| DonorAllocation {
                    donor_ref: d.donor.id,
                    amount_contributed: d.amount_contributed,
                    percentage: allocation::reconcile_percentage(
                        d.percentage,
                        d.amount_contributed,
                        total,
                    ),
                })
                .collect(),
            activities: stored
                .activities
                .iter()
                .map(|a| Activity {
                    name: a.name.clone(),
                    budget_assigned: a.budget_assigned,
                    percentage_of_total: allocation::reconcile_percentage(
                        a.percentage_of_total,
                        a.budget_assigned,
                        total,
                    ),
                    progress: a.progress,
                    start_date: a.start_date,
                    end_date: a.end_date,
                    beneficiary_links: a.beneficiaries.iter().map(|b| b.id).collect(),
                    notes: a.notes.clone(),
                })
                .collect(),
            locations: stored.locations.clone(),
            evidence_files: stored
                .evidence
                .iter()
                .map(|e| EvidenceFile {
                    file_name: e.file_name.clone(),
                    mime_type: e.mime_type.clone(),
                    size_bytes: e.size_bytes,
                    source: EvidenceSource::Reference { url: e.url.clone() },
                })
                .collect(),
            status: stored.status,
        }
    }

    /// Serialize the draft into the shape the persistence collaborator
    /// accepts. Inline evidence bytes are not part of the payload; they are
    /// uploaded separately and only their metadata travels here.
    pub fn to_payload(&self) -> ProjectPayload {
        ProjectPayload {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            assigned_manager: self.assigned_manager,
            budget_total: self.budget_total,
            start_date: self.start_date,
            end_date: self.end_date,
            global_objectives: self.global_objectives.clone(),
            strategic_lines: self.strategic_lines.clone(),
            donors: self
                .donors
                .iter()
                .map(|d| DonorPayload {
                    donor: d.donor_ref,
                    amount_contributed: d.amount_contributed,
                    percentage: d.percentage,
                })
                .collect(),
            activities: self
                .activities
                .iter()
                .map(|a| ActivityPayload {
                    name: a.name.clone(),
                    budget_assigned: a.budget_assigned,
                    percentage_of_total: a.percentage_of_total,
                    progress: a.progress,
                    start_date: a.start_date,
                    end_date: a.end_date,
                    beneficiaries: a.beneficiary_links.clone(),
                    notes: a.notes.clone(),
                })
                .collect(),
            locations: self.locations.clone(),
            evidence: self
                .evidence_files
                .iter()
                .map(|e| EvidencePayload {
                    file_name: e.file_name.clone(),
                    mime_type: e.mime_type.clone(),
                    size_bytes: e.size_bytes,
                    url: match &e.source {
                        EvidenceSource::Reference { url } => Some(url.clone()),
                        EvidenceSource::Inline { .. } => None,
                    },
                })
                .collect(),
            status: self.status,
            overall_progress: self.overall_progress(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored project (backend shape)
// ---------------------------------------------------------------------------

/// A foreign-key object as the backend nests it (`{"id": 3, "name": "…"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefObject {
    pub id: DbId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDonor {
    pub donor: RefObject,
    pub amount_contributed: Money,
    #[serde(default)]
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredActivity {
    pub name: String,
    pub budget_assigned: Money,
    #[serde(default)]
    pub percentage_of_total: Decimal,
    #[serde(default)]
    pub progress: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub beneficiaries: Vec<RefObject>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvidence {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub url: String,
}

/// A project as returned by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProject {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub assigned_manager: Option<RefObject>,
    pub budget_total: Money,
    #[serde(default)]
    pub budget_executed: Money,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub global_objectives: Vec<RefObject>,
    #[serde(default)]
    pub strategic_lines: Vec<RefObject>,
    #[serde(default)]
    pub donors: Vec<StoredDonor>,
    #[serde(default)]
    pub activities: Vec<StoredActivity>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub evidence: Vec<StoredEvidence>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub overall_progress: Decimal,
}

// ---------------------------------------------------------------------------
// Payload (what gets sent)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorPayload {
    pub donor: DbId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_contributed: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget_assigned: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_of_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub progress: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub beneficiaries: Vec<DbId>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePayload {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Serialized draft handed to `create_project` / `update_project`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPayload {
    pub name: String,
    pub description: String,
    pub assigned_manager: Option<DbId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget_total: Money,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub global_objectives: Vec<DbId>,
    pub strategic_lines: Vec<DbId>,
    pub donors: Vec<DonorPayload>,
    pub activities: Vec<ActivityPayload>,
    pub locations: Vec<Location>,
    pub evidence: Vec<EvidencePayload>,
    pub status: ProjectStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub overall_progress: Decimal,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
