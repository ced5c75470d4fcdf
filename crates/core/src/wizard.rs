//! Project wizard steps and the step gate.
//!
//! The wizard is a linear sequence of seven sections. Moving forward runs
//! the field validator over the fields the current step owns and only
//! advances when they all pass; moving back is always allowed. Submission is
//! only reachable from the last step.

use serde::{Deserialize, Serialize};

use crate::draft::ProjectDraft;
use crate::error::CoreError;
use crate::reference::ReferenceData;
use crate::types::DbId;
use crate::validation::{self, Field, FieldReport};

// ---------------------------------------------------------------------------
// Wizard status and mode
// ---------------------------------------------------------------------------

/// Status values for a wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl WizardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Whether the wizard creates a new project or edits a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WizardMode {
    Create,
    Edit { project_id: DbId },
}

// ---------------------------------------------------------------------------
// Wizard steps
// ---------------------------------------------------------------------------

/// The seven sections of the project wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BasicInfo,
    ObjectivesStrategy,
    Donors,
    Locations,
    Activities,
    Evidence,
    FinalConfiguration,
}

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 7;

impl WizardStep {
    /// Convert a 1-based step number to a `WizardStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::BasicInfo),
            2 => Ok(Self::ObjectivesStrategy),
            3 => Ok(Self::Donors),
            4 => Ok(Self::Locations),
            5 => Ok(Self::Activities),
            6 => Ok(Self::Evidence),
            7 => Ok(Self::FinalConfiguration),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    pub fn to_number(self) -> u8 {
        match self {
            Self::BasicInfo => 1,
            Self::ObjectivesStrategy => 2,
            Self::Donors => 3,
            Self::Locations => 4,
            Self::Activities => 5,
            Self::Evidence => 6,
            Self::FinalConfiguration => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Info",
            Self::ObjectivesStrategy => "Objectives & Strategy",
            Self::Donors => "Donors",
            Self::Locations => "Locations",
            Self::Activities => "Activities",
            Self::Evidence => "Evidence",
            Self::FinalConfiguration => "Final Configuration",
        }
    }

    /// Fields this step must pass before the wizard moves past it.
    ///
    /// The locations step owns one field per location currently in the
    /// draft; evidence and final configuration own none.
    pub fn fields(self, draft: &ProjectDraft) -> Vec<Field> {
        match self {
            Self::BasicInfo => vec![
                Field::Name,
                Field::AssignedManager,
                Field::BudgetTotal,
                Field::StartDate,
                Field::EndDate,
            ],
            Self::ObjectivesStrategy => vec![Field::GlobalObjectives, Field::StrategicLines],
            Self::Donors => vec![Field::Donors],
            Self::Locations => (0..draft.locations.len()).map(Field::Location).collect(),
            Self::Activities => vec![Field::Activities],
            Self::Evidence | Self::FinalConfiguration => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Run the validator over every field `step` owns.
pub fn validate_step(step: WizardStep, draft: &ProjectDraft, refs: &ReferenceData) -> FieldReport {
    validation::validate_fields(&step.fields(draft), draft, refs)
}

/// Run every step's validation, merged into one report.
pub fn validate_all_steps(draft: &ProjectDraft, refs: &ReferenceData) -> FieldReport {
    let fields: Vec<Field> = (MIN_STEP..=MAX_STEP)
        .filter_map(|n| WizardStep::from_number(n).ok())
        .flat_map(|step| step.fields(draft))
        .collect();
    validation::validate_fields(&fields, draft, refs)
}

// ---------------------------------------------------------------------------
// Step gate
// ---------------------------------------------------------------------------

/// Result of asking the gate to move forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Validation passed. `to == from` when already on the last step.
    Advanced { from: u8, to: u8 },
    /// Validation failed; the step did not change.
    Blocked { step: u8, errors: FieldReport },
}

impl StepOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Why submission is not allowed yet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error(
        "Submission is only available on step {last}, currently on step {current}",
        last = MAX_STEP
    )]
    NotOnFinalStep { current: u8 },

    #[error("The project has validation errors: {}", .0.summary())]
    Invalid(FieldReport),
}

/// Linear wizard state machine over steps `1..=7`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGate {
    current: u8,
}

impl Default for StepGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StepGate {
    pub fn new() -> Self {
        Self { current: MIN_STEP }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn step(&self) -> WizardStep {
        // `current` never leaves MIN_STEP..=MAX_STEP.
        WizardStep::from_number(self.current).unwrap_or(WizardStep::BasicInfo)
    }

    pub fn is_on_final_step(&self) -> bool {
        self.current == MAX_STEP
    }

    /// Validate the current step and advance by one when it passes.
    pub fn next(&mut self, draft: &ProjectDraft, refs: &ReferenceData) -> StepOutcome {
        let from = self.current;
        let errors = validate_step(self.step(), draft, refs);
        if !errors.is_empty() {
            tracing::debug!(step = from, failures = errors.len(), "Step advance blocked");
            return StepOutcome::Blocked { step: from, errors };
        }
        self.current = (from + 1).min(MAX_STEP);
        tracing::debug!(from, to = self.current, "Step advanced");
        StepOutcome::Advanced {
            from,
            to: self.current,
        }
    }

    /// Go back one step without validation. Stays on step 1.
    pub fn previous(&mut self) -> u8 {
        self.current = self.current.saturating_sub(1).max(MIN_STEP);
        self.current
    }

    /// Check that the draft may be handed to the persistence collaborator.
    ///
    /// Only allowed on the final step; every step's fields are re-validated
    /// because earlier sections may have been edited after they were passed.
    pub fn can_submit(&self, draft: &ProjectDraft, refs: &ReferenceData) -> Result<(), SubmitBlocked> {
        if !self.is_on_final_step() {
            return Err(SubmitBlocked::NotOnFinalStep {
                current: self.current,
            });
        }
        let errors = validate_all_steps(draft, refs);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SubmitBlocked::Invalid(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::draft::{DonorAllocation, Location};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn complete_draft() -> ProjectDraft {
        let mut draft = ProjectDraft::new();
        draft.name = "Clean water".to_string();
        draft.assigned_manager = Some(7);
        draft.budget_total = d("1000");
        draft.start_date = Some(date("2024-01-01"));
        draft.end_date = Some(date("2024-12-31"));
        draft.global_objectives = vec![1];
        draft.strategic_lines = vec![2];
        draft.donors = vec![
            DonorAllocation::new(11, d("600")),
            DonorAllocation::new(12, d("400")),
        ];
        draft.locations = vec![Location {
            department: "Cauca".to_string(),
            municipality: "Popayán".to_string(),
            locality: "La Vega".to_string(),
            priority: 1,
        }];
        draft.recompute_percentages();
        draft
    }

    fn refs() -> ReferenceData {
        ReferenceData::default()
    }

    // -- WizardStep --

    #[test]
    fn step_from_number_valid_and_invalid() {
        assert_eq!(WizardStep::from_number(1).unwrap(), WizardStep::BasicInfo);
        assert_eq!(
            WizardStep::from_number(7).unwrap(),
            WizardStep::FinalConfiguration
        );
        assert!(WizardStep::from_number(0).is_err());
        assert!(WizardStep::from_number(8).is_err());
    }

    #[test]
    fn step_to_number_roundtrip() {
        for n in MIN_STEP..=MAX_STEP {
            let step = WizardStep::from_number(n).unwrap();
            assert_eq!(step.to_number(), n);
            assert!(!step.label().is_empty());
        }
    }

    #[test]
    fn step_field_ownership() {
        let draft = complete_draft();
        assert_eq!(WizardStep::BasicInfo.fields(&draft).len(), 5);
        assert_eq!(
            WizardStep::ObjectivesStrategy.fields(&draft),
            vec![Field::GlobalObjectives, Field::StrategicLines]
        );
        assert_eq!(WizardStep::Donors.fields(&draft), vec![Field::Donors]);
        assert_eq!(
            WizardStep::Locations.fields(&draft),
            vec![Field::Location(0)]
        );
        assert!(WizardStep::Evidence.fields(&draft).is_empty());
        assert!(WizardStep::FinalConfiguration.fields(&draft).is_empty());
    }

    // -- StepGate --

    #[test]
    fn gate_starts_on_step_one() {
        let gate = StepGate::new();
        assert_eq!(gate.current(), 1);
        assert_eq!(gate.step(), WizardStep::BasicInfo);
    }

    #[test]
    fn previous_from_step_one_stays() {
        let mut gate = StepGate::new();
        assert_eq!(gate.previous(), 1);
        assert_eq!(gate.previous(), 1);
    }

    #[test]
    fn next_never_advances_with_missing_fields() {
        let mut gate = StepGate::new();
        let draft = ProjectDraft::new();
        for _ in 0..5 {
            let outcome = gate.next(&draft, &refs());
            assert_matches!(outcome, StepOutcome::Blocked { step: 1, .. });
            assert_eq!(gate.current(), 1);
        }
    }

    #[test]
    fn blocked_outcome_lists_failing_fields() {
        let mut gate = StepGate::new();
        let mut draft = complete_draft();
        draft.name.clear();
        draft.budget_total = Decimal::ZERO;
        match gate.next(&draft, &refs()) {
            StepOutcome::Blocked { errors, .. } => {
                assert!(errors.contains("name"));
                assert!(errors.contains("budget_total"));
                assert!(!errors.contains("start_date"));
            }
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[test]
    fn complete_draft_walks_to_final_step() {
        let mut gate = StepGate::new();
        let draft = complete_draft();
        for expected in 2..=MAX_STEP {
            let outcome = gate.next(&draft, &refs());
            assert!(outcome.is_advanced());
            assert_eq!(gate.current(), expected);
        }
        // Capped at the last step.
        assert_eq!(
            gate.next(&draft, &refs()),
            StepOutcome::Advanced { from: 7, to: 7 }
        );
        assert!(gate.can_submit(&draft, &refs()).is_ok());
    }

    #[test]
    fn donors_step_blocks_on_unbalanced_contributions() {
        let mut gate = StepGate::new();
        let mut draft = complete_draft();
        draft.donors[1].amount_contributed = d("399");
        draft.recompute_percentages();
        gate.next(&draft, &refs());
        gate.next(&draft, &refs());
        assert_eq!(gate.current(), 3);
        assert_matches!(gate.next(&draft, &refs()), StepOutcome::Blocked { step: 3, .. });
    }

    #[test]
    fn previous_skips_validation() {
        let mut gate = StepGate::new();
        let draft = complete_draft();
        gate.next(&draft, &refs());
        gate.next(&draft, &refs());
        assert_eq!(gate.previous(), 2);
        assert_eq!(gate.previous(), 1);
    }

    #[test]
    fn submit_requires_final_step() {
        let gate = StepGate::new();
        assert_eq!(
            gate.can_submit(&complete_draft(), &refs()),
            Err(SubmitBlocked::NotOnFinalStep { current: 1 })
        );
    }

    #[test]
    fn submit_revalidates_earlier_steps() {
        let mut gate = StepGate::new();
        let mut draft = complete_draft();
        for _ in MIN_STEP..MAX_STEP {
            gate.next(&draft, &refs());
        }
        draft.name.clear();
        assert_matches!(
            gate.can_submit(&draft, &refs()),
            Err(SubmitBlocked::Invalid(report)) if report.contains("name")
        );
    }
}
