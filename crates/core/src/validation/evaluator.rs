//! Rule evaluator: pure logic over a draft snapshot.

use rust_decimal::Decimal;

use super::fields::Field;
use super::rules::{FieldCheck, FieldReport};
use crate::allocation;
use crate::draft::{Activity, ProjectDraft, MAX_PRIORITY, MIN_PRIORITY};
use crate::reference::ReferenceData;

/// Minimum trimmed length of a project name.
pub const MIN_NAME_LENGTH: usize = 3;

/// Validate a field using only the draft itself.
pub fn validate_field(field: Field, draft: &ProjectDraft) -> FieldCheck {
    evaluate(field, draft, None)
}

/// Validate a field, additionally checking references against the loaded
/// pick-lists and geographic taxonomy.
pub fn validate_field_with(field: Field, draft: &ProjectDraft, refs: &ReferenceData) -> FieldCheck {
    evaluate(field, draft, Some(refs))
}

/// Validate a field by canonical name. Unknown names are always valid.
pub fn validate_named(name: &str, draft: &ProjectDraft, refs: &ReferenceData) -> FieldCheck {
    match Field::parse(name) {
        Some(field) => validate_field_with(field, draft, refs),
        None => FieldCheck::ok(),
    }
}

/// Validate several fields and collect the failures.
pub fn validate_fields(fields: &[Field], draft: &ProjectDraft, refs: &ReferenceData) -> FieldReport {
    let mut report = FieldReport::new();
    for field in fields {
        report.record(field.key(), validate_field_with(*field, draft, refs));
    }
    report
}

fn evaluate(field: Field, draft: &ProjectDraft, refs: Option<&ReferenceData>) -> FieldCheck {
    // Membership checks only make sense against a loaded snapshot.
    let refs = refs.filter(|r| r.is_loaded());
    match field {
        Field::Name => check_name(draft),
        Field::AssignedManager => check_manager(draft, refs),
        Field::BudgetTotal => check_budget_total(draft),
        Field::StartDate => check_start_date(draft),
        Field::EndDate => check_end_date(draft),
        Field::GlobalObjectives => {
            check_non_empty(&draft.global_objectives, "Select at least one global objective")
        }
        Field::StrategicLines => {
            check_non_empty(&draft.strategic_lines, "Select at least one strategic line")
        }
        Field::Donors => check_donors(draft),
        Field::Locations => check_locations(draft, refs),
        Field::Location(i) => check_location(draft, i, refs),
        Field::Activities => check_activities(draft),
        Field::ActivityStartDate(i) => match draft.activities.get(i) {
            Some(activity) => check_activity_start(draft, activity, i),
            None => FieldCheck::ok(),
        },
        Field::ActivityEndDate(i) => match draft.activities.get(i) {
            Some(activity) => check_activity_end(draft, activity, i),
            None => FieldCheck::ok(),
        },
        Field::ActivityBudget(i) => match draft.activities.get(i) {
            Some(activity) => check_activity_budget(draft, activity, i),
            None => FieldCheck::ok(),
        },
        Field::OverallProgress => check_progress_range(draft.overall_progress(), "Overall progress"),
    }
}

// ---------------------------------------------------------------------------
// Basic info
// ---------------------------------------------------------------------------

fn check_name(draft: &ProjectDraft) -> FieldCheck {
    let name = draft.name.trim();
    if name.is_empty() {
        FieldCheck::fail("Project name is required")
    } else if name.chars().count() < MIN_NAME_LENGTH {
        FieldCheck::fail(format!(
            "Project name must be at least {MIN_NAME_LENGTH} characters"
        ))
    } else {
        FieldCheck::ok()
    }
}

fn check_manager(draft: &ProjectDraft, refs: Option<&ReferenceData>) -> FieldCheck {
    let Some(id) = draft.assigned_manager else {
        return FieldCheck::fail("An assigned manager is required");
    };
    match refs {
        Some(r) if !r.managers.is_empty() && !r.has_manager(id) => {
            FieldCheck::fail(format!("Manager {id} is not in the manager list"))
        }
        _ => FieldCheck::ok(),
    }
}

fn check_budget_total(draft: &ProjectDraft) -> FieldCheck {
    if draft.budget_total > Decimal::ZERO {
        FieldCheck::ok()
    } else {
        FieldCheck::fail("Total budget must be greater than 0")
    }
}

fn check_start_date(draft: &ProjectDraft) -> FieldCheck {
    if draft.start_date.is_some() {
        FieldCheck::ok()
    } else {
        FieldCheck::fail("Start date is required")
    }
}

fn check_end_date(draft: &ProjectDraft) -> FieldCheck {
    let Some(end) = draft.end_date else {
        return FieldCheck::fail("End date is required");
    };
    match draft.start_date {
        Some(start) if end <= start => FieldCheck::fail("End date must be after the start date"),
        _ => FieldCheck::ok(),
    }
}

fn check_non_empty<T>(items: &[T], message: &str) -> FieldCheck {
    if items.is_empty() {
        FieldCheck::fail(message)
    } else {
        FieldCheck::ok()
    }
}

// ---------------------------------------------------------------------------
// Donors
// ---------------------------------------------------------------------------

fn check_donors(draft: &ProjectDraft) -> FieldCheck {
    if draft.donors.is_empty() {
        return FieldCheck::fail("At least one donor is required");
    }
    let contributed = draft.donor_total();
    if contributed != draft.budget_total {
        return FieldCheck::fail(format!(
            "Donor contributions total {contributed} but the project budget is {}",
            draft.budget_total
        ));
    }
    let percent = allocation::percentage_sum_rounded(&draft.donors);
    if percent != Decimal::ONE_HUNDRED {
        return FieldCheck::fail(format!(
            "Donor percentages must add up to 100% (currently {percent}%)"
        ));
    }
    FieldCheck::ok()
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

fn check_locations(draft: &ProjectDraft, refs: Option<&ReferenceData>) -> FieldCheck {
    (0..draft.locations.len())
        .map(|i| check_location(draft, i, refs))
        .find(|check| !check.is_valid)
        .unwrap_or_else(FieldCheck::ok)
}

fn check_location(draft: &ProjectDraft, index: usize, refs: Option<&ReferenceData>) -> FieldCheck {
    let Some(location) = draft.locations.get(index) else {
        return FieldCheck::ok();
    };
    let n = index + 1;
    if location.department.trim().is_empty() {
        return FieldCheck::fail(format!("Location {n}: department is required"));
    }
    if location.municipality.trim().is_empty() {
        return FieldCheck::fail(format!("Location {n}: municipality is required"));
    }
    if location.locality.trim().is_empty() {
        return FieldCheck::fail(format!("Location {n}: locality is required"));
    }
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&location.priority) {
        return FieldCheck::fail(format!(
            "Location {n}: priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}"
        ));
    }
    if let Some(geo) = refs.map(|r| &r.geography).filter(|g| !g.is_empty()) {
        if !geo.contains(&location.department, &location.municipality) {
            return FieldCheck::fail(format!(
                "Location {n}: {} is not a municipality of {}",
                location.municipality, location.department
            ));
        }
    }
    FieldCheck::ok()
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

fn check_activities(draft: &ProjectDraft) -> FieldCheck {
    let assigned = draft.activity_total();
    if assigned > draft.budget_total {
        return FieldCheck::fail(format!(
            "Activity budgets total {assigned}, exceeding the project budget of {}",
            draft.budget_total
        ));
    }
    for (i, activity) in draft.activities.iter().enumerate() {
        for check in [
            check_activity_start(draft, activity, i),
            check_activity_end(draft, activity, i),
            check_progress_range(activity.progress, &format!("Activity {} progress", i + 1)),
        ] {
            if !check.is_valid {
                return check;
            }
        }
    }
    FieldCheck::ok()
}

fn check_activity_start(draft: &ProjectDraft, activity: &Activity, index: usize) -> FieldCheck {
    let Some(start) = activity.start_date else {
        return FieldCheck::ok();
    };
    let n = index + 1;
    if let Some(project_start) = draft.start_date {
        if start < project_start {
            return FieldCheck::fail(format!(
                "Activity {n} cannot start before the project starts ({project_start})"
            ));
        }
    }
    if let Some(project_end) = draft.end_date {
        if start > project_end {
            return FieldCheck::fail(format!(
                "Activity {n} cannot start after the project ends ({project_end})"
            ));
        }
    }
    match activity.end_date {
        Some(end) if start > end => {
            FieldCheck::fail(format!("Activity {n} cannot start after it ends"))
        }
        _ => FieldCheck::ok(),
    }
}

fn check_activity_end(draft: &ProjectDraft, activity: &Activity, index: usize) -> FieldCheck {
    let Some(end) = activity.end_date else {
        return FieldCheck::ok();
    };
    let n = index + 1;
    if let Some(project_end) = draft.end_date {
        if end > project_end {
            return FieldCheck::fail(format!(
                "Activity {n} cannot end after the project ends ({project_end})"
            ));
        }
    }
    match activity.start_date {
        Some(start) if end < start => {
            FieldCheck::fail(format!("Activity {n} cannot end before it starts"))
        }
        _ => FieldCheck::ok(),
    }
}

fn check_activity_budget(draft: &ProjectDraft, activity: &Activity, index: usize) -> FieldCheck {
    let n = index + 1;
    if activity.budget_assigned.is_sign_negative() {
        return FieldCheck::fail(format!("Activity {n} budget cannot be negative"));
    }
    let assigned = draft.activity_total();
    if assigned > draft.budget_total {
        return FieldCheck::fail(format!(
            "Activity budgets total {assigned}, exceeding the project budget of {}",
            draft.budget_total
        ));
    }
    FieldCheck::ok()
}

fn check_progress_range(value: Decimal, label: &str) -> FieldCheck {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        FieldCheck::fail(format!("{label} must be between 0 and 100"))
    } else {
        FieldCheck::ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
