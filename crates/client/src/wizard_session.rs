//! One open project wizard: the draft, the step gate, the reference-data
//! snapshot, and the notification sink, owned together.
//!
//! Every guard rejection and failed transition is reported through the sink
//! as a warning; the draft is never left half-changed.

use std::sync::Arc;

use pmis_core::change::{apply_field_change, ChangeRejected, FieldChange};
use pmis_core::draft::{ProjectDraft, StoredProject};
use pmis_core::error::CoreError;
use pmis_core::evidence::{self, CandidateFile, IntakeReport};
use pmis_core::reference::ReferenceData;
use pmis_core::summary::ProjectSummary;
use pmis_core::validation::{self, FieldCheck};
use pmis_core::wizard::{StepGate, StepOutcome, WizardMode, WizardStatus, WizardStep};
use pmis_events::{Notification, NotificationSink};

use crate::error::ClientError;
use crate::session::Session;
use crate::store::{ProjectStore, ReferenceSource};

/// Load pick-lists for a new wizard. On failure the wizard still opens, with
/// empty lists and a warning.
pub async fn load_reference_data(
    source: &dyn ReferenceSource,
    session: &Session,
    sink: &dyn NotificationSink,
) -> ReferenceData {
    match source.fetch_reference_data(session).await {
        Ok(refs) => refs,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load reference data");
            sink.notify(Notification::warning(
                "Could not load reference data. Lists will be empty until the connection is restored.",
            ));
            ReferenceData::degraded()
        }
    }
}

pub struct WizardSession {
    mode: WizardMode,
    status: WizardStatus,
    draft: ProjectDraft,
    gate: StepGate,
    refs: ReferenceData,
    sink: Arc<dyn NotificationSink>,
}

impl WizardSession {
    /// Open an empty wizard for a new project.
    pub fn create(refs: ReferenceData, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            mode: WizardMode::Create,
            status: WizardStatus::InProgress,
            draft: ProjectDraft::new(),
            gate: StepGate::new(),
            refs,
            sink,
        }
    }

    /// Open the wizard on a stored project.
    pub fn edit(stored: &StoredProject, refs: ReferenceData, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            mode: WizardMode::Edit {
                project_id: stored.id,
            },
            status: WizardStatus::InProgress,
            draft: ProjectDraft::hydrate(stored),
            gate: StepGate::new(),
            refs,
            sink,
        }
    }

    /// Fetch reference data, then open an empty wizard.
    pub async fn start_with(
        source: &dyn ReferenceSource,
        session: &Session,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let refs = load_reference_data(source, session, sink.as_ref()).await;
        Self::create(refs, sink)
    }

    /// Fetch reference data, then open the wizard on `stored`.
    pub async fn edit_with(
        source: &dyn ReferenceSource,
        session: &Session,
        stored: &StoredProject,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let refs = load_reference_data(source, session, sink.as_ref()).await;
        Self::edit(stored, refs, sink)
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn draft(&self) -> &ProjectDraft {
        &self.draft
    }

    pub fn reference_data(&self) -> &ReferenceData {
        &self.refs
    }

    pub fn current_step(&self) -> u8 {
        self.gate.current()
    }

    pub fn step(&self) -> WizardStep {
        self.gate.step()
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary::from_draft(&self.draft)
    }

    /// On-blur validation of a single field by canonical name.
    pub fn check_field(&self, name: &str) -> FieldCheck {
        validation::validate_named(name, &self.draft, &self.refs)
    }

    /// Apply one edit. A rejected edit leaves the draft untouched and is
    /// reported as a warning.
    pub fn apply(&mut self, change: FieldChange) -> Result<(), ChangeRejected> {
        match apply_field_change(&self.draft, change, &self.refs) {
            Ok(next) => {
                self.draft = next;
                Ok(())
            }
            Err(rejected) => {
                tracing::warn!(step = self.gate.current(), reason = %rejected, "Change rejected");
                self.sink.notify(Notification::warning(rejected.to_string()));
                Err(rejected)
            }
        }
    }

    pub fn next(&mut self) -> StepOutcome {
        let outcome = self.gate.next(&self.draft, &self.refs);
        if let StepOutcome::Blocked { step, errors } = &outcome {
            tracing::warn!(step, failures = errors.len(), "Step validation failed");
            self.sink.notify(Notification::warning(format!(
                "Please correct the highlighted fields before continuing: {}",
                errors.summary()
            )));
        }
        outcome
    }

    pub fn previous(&mut self) -> u8 {
        self.gate.previous()
    }

    /// Run candidate files through intake and attach the accepted ones.
    pub fn add_evidence(&mut self, candidates: Vec<CandidateFile>) -> IntakeReport {
        let report = evidence::intake(candidates);
        for rejected in &report.rejected {
            self.sink.notify(Notification::warning(format!(
                "{} was not added: {}",
                rejected.file_name, rejected.reason
            )));
        }
        if !report.accepted.is_empty() {
            let attached = self.apply(FieldChange::AttachEvidence {
                files: report.accepted.clone(),
            });
            // Intake and the reducer apply the same file checks.
            if let Err(rejected) = attached {
                tracing::error!(
                    reason = %rejected,
                    files = report.accepted.len(),
                    "Accepted evidence could not be attached"
                );
                debug_assert!(false, "evidence intake and reducer disagree: {rejected}");
            }
        }
        report
    }

    /// Hand the draft to the store. Only allowed on the last step, with
    /// every step valid and the session still active.
    ///
    /// On failure the draft and step are kept so nothing entered is lost.
    pub async fn submit(
        &mut self,
        store: &dyn ProjectStore,
        session: &Session,
    ) -> Result<StoredProject, ClientError> {
        if self.status != WizardStatus::InProgress {
            return Err(CoreError::Conflict(format!(
                "The wizard is {} and can no longer be submitted",
                self.status.as_str()
            ))
            .into());
        }

        let result = self.try_submit(store, session).await;
        match &result {
            Ok(project) => {
                self.status = WizardStatus::Completed;
                tracing::info!(project_id = project.id, mode = ?self.mode, "Project saved");
                let verb = match self.mode {
                    WizardMode::Create => "created",
                    WizardMode::Edit { .. } => "updated",
                };
                self.sink.notify(Notification::success(format!(
                    "Project '{}' {verb} successfully",
                    project.name
                )));
            }
            Err(e @ ClientError::Blocked(_)) => {
                tracing::warn!(error = %e, "Submission blocked");
                self.sink.notify(Notification::warning(e.user_message()));
            }
            Err(e) => {
                tracing::error!(error = %e, "Project submission failed");
                self.sink.notify(Notification::error(e.user_message()));
            }
        }
        result
    }

    async fn try_submit(
        &self,
        store: &dyn ProjectStore,
        session: &Session,
    ) -> Result<StoredProject, ClientError> {
        if !session.is_active() {
            return Err(ClientError::SessionEnded);
        }
        self.gate.can_submit(&self.draft, &self.refs)?;

        let payload = self.draft.to_payload();
        match self.mode {
            WizardMode::Create => store.create_project(session, &payload).await,
            WizardMode::Edit { project_id } => {
                store.update_project(session, project_id, &payload).await
            }
        }
    }

    /// Close the wizard without saving. Consumes the session; the draft is
    /// dropped.
    pub fn abandon(self) -> WizardStatus {
        tracing::debug!(step = self.gate.current(), mode = ?self.mode, "Wizard abandoned");
        WizardStatus::Abandoned
    }
}
