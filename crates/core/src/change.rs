//! Draft change reducer.
//!
//! [`apply_field_change`] is the only way the wizard mutates a
//! [`ProjectDraft`]. It works on a copy and returns either the updated draft
//! or a [`ChangeRejected`] describing why the write was refused, in which case
//! the caller's draft is untouched.
//!
//! Donor amounts and activity budgets go through the over-allocation guard:
//! the write is refused when the allocations across all other entries plus
//! the proposed value would exceed `budget_total`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation;
use crate::draft::{
    Activity, DonorAllocation, EvidenceFile, Location, ProjectDraft, ProjectStatus, MAX_PRIORITY,
    MIN_PRIORITY,
};
use crate::evidence::{self, RejectionReason};
use crate::reference::{PickItem, ReferenceData};
use crate::types::{DbId, Money};

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

/// A single user edit to the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldChange {
    SetName { name: String },
    SetDescription { description: String },
    SetManager { manager: Option<DbId> },
    SetBudgetTotal { amount: Money },
    SetStartDate { date: Option<NaiveDate> },
    SetEndDate { date: Option<NaiveDate> },
    SetGlobalObjectives { ids: Vec<DbId> },
    SetStrategicLines { ids: Vec<DbId> },

    AddDonor { donor_ref: DbId, amount: Money },
    UpdateDonorAmount { index: usize, amount: Money },
    RemoveDonor { index: usize },

    AddActivity { name: String, budget_assigned: Money },
    UpdateActivityBudget { index: usize, amount: Money },
    UpdateActivityProgress { index: usize, progress: Decimal },
    UpdateActivityDates {
        index: usize,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
    UpdateActivityDetails { index: usize, name: String, notes: String },
    SetActivityBeneficiaries { index: usize, beneficiaries: Vec<DbId> },
    RemoveActivity { index: usize },

    AddLocation { location: Location },
    /// Changing the department clears the municipality.
    UpdateLocationDepartment { index: usize, department: String },
    UpdateLocationMunicipality { index: usize, municipality: String },
    UpdateLocationLocality { index: usize, locality: String },
    UpdateLocationPriority { index: usize, priority: u8 },
    RemoveLocation { index: usize },

    AttachEvidence { files: Vec<EvidenceFile> },
    RemoveEvidence { index: usize },

    SetStatus { status: ProjectStatus },
}

/// Why a change was refused. The draft is left as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChangeRejected {
    #[error("Allocations would total {projected}, exceeding the project budget of {ceiling}")]
    OverAllocation { ceiling: Money, projected: Money },

    #[error("{field} cannot be negative")]
    NegativeAmount { field: &'static str },

    #[error("Progress must be between 0 and 100, got {value}")]
    ProgressOutOfRange { value: Decimal },

    #[error(
        "Priority must be between {min} and {max}, got {value}",
        min = MIN_PRIORITY,
        max = MAX_PRIORITY
    )]
    PriorityOutOfRange { value: u8 },

    #[error("No {collection} entry at position {index}")]
    IndexOutOfRange { collection: &'static str, index: usize },

    #[error("Donor {donor_ref} is already part of this project")]
    DuplicateDonor { donor_ref: DbId },

    #[error("Unknown {kind} {id}")]
    UnknownReference { kind: &'static str, id: DbId },

    #[error("{municipality} is not a municipality of {department}")]
    MunicipalityMismatch {
        department: String,
        municipality: String,
    },

    #[error("Evidence file '{file_name}' rejected: {reason}")]
    InvalidEvidence {
        file_name: String,
        reason: RejectionReason,
    },
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Apply `change` to a copy of `draft`.
///
/// Derived percentages are recomputed on every accepted change.
pub fn apply_field_change(
    draft: &ProjectDraft,
    change: FieldChange,
    refs: &ReferenceData,
) -> Result<ProjectDraft, ChangeRejected> {
    let mut next = draft.clone();
    apply(&mut next, change, refs)?;
    next.recompute_percentages();
    Ok(next)
}

fn apply(
    draft: &mut ProjectDraft,
    change: FieldChange,
    refs: &ReferenceData,
) -> Result<(), ChangeRejected> {
    match change {
        FieldChange::SetName { name } => draft.name = name,
        FieldChange::SetDescription { description } => draft.description = description,
        FieldChange::SetManager { manager } => {
            if let Some(id) = manager {
                require_known(refs, &refs.managers, "manager", id)?;
            }
            draft.assigned_manager = manager;
        }
        FieldChange::SetBudgetTotal { amount } => {
            require_non_negative(amount, "Total budget")?;
            draft.budget_total = amount;
        }
        FieldChange::SetStartDate { date } => draft.start_date = date,
        FieldChange::SetEndDate { date } => draft.end_date = date,
        FieldChange::SetGlobalObjectives { ids } => {
            for id in &ids {
                require_known(refs, &refs.global_objectives, "global objective", *id)?;
            }
            draft.global_objectives = ids;
        }
        FieldChange::SetStrategicLines { ids } => {
            for id in &ids {
                require_known(refs, &refs.strategic_lines, "strategic line", *id)?;
            }
            draft.strategic_lines = ids;
        }

        // -- donors --
        FieldChange::AddDonor { donor_ref, amount } => {
            require_known(refs, &refs.donors, "donor", donor_ref)?;
            if draft.donors.iter().any(|d| d.donor_ref == donor_ref) {
                return Err(ChangeRejected::DuplicateDonor { donor_ref });
            }
            require_non_negative(amount, "Donor contribution")?;
            let amounts = donor_amounts(draft);
            guard_allocation(draft.budget_total, &amounts, amounts.len(), amount)?;
            draft.donors.push(DonorAllocation::new(donor_ref, amount));
        }
        FieldChange::UpdateDonorAmount { index, amount } => {
            require_index(draft.donors.len(), "donor", index)?;
            require_non_negative(amount, "Donor contribution")?;
            guard_allocation(draft.budget_total, &donor_amounts(draft), index, amount)?;
            draft.donors[index].amount_contributed = amount;
        }
        FieldChange::RemoveDonor { index } => {
            require_index(draft.donors.len(), "donor", index)?;
            draft.donors.remove(index);
        }

        // -- activities --
        FieldChange::AddActivity {
            name,
            budget_assigned,
        } => {
            require_non_negative(budget_assigned, "Activity budget")?;
            let amounts = activity_amounts(draft);
            guard_allocation(draft.budget_total, &amounts, amounts.len(), budget_assigned)?;
            let mut activity = Activity::new(name);
            activity.budget_assigned = budget_assigned;
            draft.activities.push(activity);
        }
        FieldChange::UpdateActivityBudget { index, amount } => {
            require_index(draft.activities.len(), "activity", index)?;
            require_non_negative(amount, "Activity budget")?;
            guard_allocation(draft.budget_total, &activity_amounts(draft), index, amount)?;
            draft.activities[index].budget_assigned = amount;
        }
        FieldChange::UpdateActivityProgress { index, progress } => {
            require_index(draft.activities.len(), "activity", index)?;
            if progress < Decimal::ZERO || progress > Decimal::ONE_HUNDRED {
                return Err(ChangeRejected::ProgressOutOfRange { value: progress });
            }
            draft.activities[index].progress = progress;
        }
        FieldChange::UpdateActivityDates {
            index,
            start_date,
            end_date,
        } => {
            require_index(draft.activities.len(), "activity", index)?;
            let activity = &mut draft.activities[index];
            activity.start_date = start_date;
            activity.end_date = end_date;
        }
        FieldChange::UpdateActivityDetails { index, name, notes } => {
            require_index(draft.activities.len(), "activity", index)?;
            let activity = &mut draft.activities[index];
            activity.name = name;
            activity.notes = notes;
        }
        FieldChange::SetActivityBeneficiaries {
            index,
            beneficiaries,
        } => {
            require_index(draft.activities.len(), "activity", index)?;
            for id in &beneficiaries {
                require_known(refs, &refs.beneficiaries, "beneficiary", *id)?;
            }
            draft.activities[index].beneficiary_links = beneficiaries;
        }
        FieldChange::RemoveActivity { index } => {
            require_index(draft.activities.len(), "activity", index)?;
            draft.activities.remove(index);
        }

        // -- locations --
        FieldChange::AddLocation { location } => {
            require_priority(location.priority)?;
            require_municipality(refs, &location.department, &location.municipality)?;
            draft.locations.push(location);
        }
        FieldChange::UpdateLocationDepartment { index, department } => {
            require_index(draft.locations.len(), "location", index)?;
            let location = &mut draft.locations[index];
            if location.department != department {
                location.municipality.clear();
            }
            location.department = department;
        }
        FieldChange::UpdateLocationMunicipality {
            index,
            municipality,
        } => {
            require_index(draft.locations.len(), "location", index)?;
            require_municipality(refs, &draft.locations[index].department, &municipality)?;
            draft.locations[index].municipality = municipality;
        }
        FieldChange::UpdateLocationLocality { index, locality } => {
            require_index(draft.locations.len(), "location", index)?;
            draft.locations[index].locality = locality;
        }
        FieldChange::UpdateLocationPriority { index, priority } => {
            require_index(draft.locations.len(), "location", index)?;
            require_priority(priority)?;
            draft.locations[index].priority = priority;
        }
        FieldChange::RemoveLocation { index } => {
            require_index(draft.locations.len(), "location", index)?;
            draft.locations.remove(index);
        }

        // -- evidence --
        FieldChange::AttachEvidence { files } => {
            for file in &files {
                if let Err(reason) = evidence::check_file(&file.mime_type, file.size_bytes) {
                    return Err(ChangeRejected::InvalidEvidence {
                        file_name: file.file_name.clone(),
                        reason,
                    });
                }
            }
            draft.evidence_files.extend(files);
        }
        FieldChange::RemoveEvidence { index } => {
            require_index(draft.evidence_files.len(), "evidence", index)?;
            draft.evidence_files.remove(index);
        }

        FieldChange::SetStatus { status } => draft.status = status,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn donor_amounts(draft: &ProjectDraft) -> Vec<Money> {
    draft.donors.iter().map(|d| d.amount_contributed).collect()
}

fn activity_amounts(draft: &ProjectDraft) -> Vec<Money> {
    draft.activities.iter().map(|a| a.budget_assigned).collect()
}

/// Refuse a write that would push the allocated sum past `ceiling`.
fn guard_allocation(
    ceiling: Money,
    existing: &[Money],
    index: usize,
    proposed: Money,
) -> Result<(), ChangeRejected> {
    match allocation::projected_total(existing, index, proposed) {
        Some(projected) if projected <= ceiling => Ok(()),
        Some(projected) => Err(ChangeRejected::OverAllocation { ceiling, projected }),
        // Past the representable range, so past any ceiling.
        None => Err(ChangeRejected::OverAllocation {
            ceiling,
            projected: Decimal::MAX,
        }),
    }
}

fn require_non_negative(amount: Money, field: &'static str) -> Result<(), ChangeRejected> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ChangeRejected::NegativeAmount { field });
    }
    Ok(())
}

fn require_index(len: usize, collection: &'static str, index: usize) -> Result<(), ChangeRejected> {
    if index >= len {
        return Err(ChangeRejected::IndexOutOfRange { collection, index });
    }
    Ok(())
}

fn require_priority(priority: u8) -> Result<(), ChangeRejected> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(ChangeRejected::PriorityOutOfRange { value: priority });
    }
    Ok(())
}

/// Pick-list membership, skipped when the snapshot is degraded or the list
/// was never populated.
fn require_known(
    refs: &ReferenceData,
    items: &[PickItem],
    kind: &'static str,
    id: DbId,
) -> Result<(), ChangeRejected> {
    if !refs.is_loaded() || items.is_empty() || items.iter().any(|item| item.id == id) {
        return Ok(());
    }
    Err(ChangeRejected::UnknownReference { kind, id })
}

fn require_municipality(
    refs: &ReferenceData,
    department: &str,
    municipality: &str,
) -> Result<(), ChangeRejected> {
    let geo = &refs.geography;
    if !refs.is_loaded() || geo.is_empty() || municipality.is_empty() {
        return Ok(());
    }
    if geo.contains(department, municipality) {
        Ok(())
    } else {
        Err(ChangeRejected::MunicipalityMismatch {
            department: department.to_string(),
            municipality: municipality.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
