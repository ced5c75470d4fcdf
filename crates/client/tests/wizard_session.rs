//! Integration tests for the wizard session driver against in-memory
//! collaborators.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use pmis_client::error::ClientError;
use pmis_client::session::Session;
use pmis_client::wizard_session::WizardSession;
use pmis_core::change::{ChangeRejected, FieldChange};
use pmis_core::draft::{EvidenceSource, Location, ProjectStatus};
use pmis_core::evidence::CandidateFile;
use pmis_core::wizard::{StepOutcome, SubmitBlocked, WizardMode, WizardStatus, MAX_STEP};
use pmis_events::NotificationLevel;

use common::{d, reference_data, session, InMemoryStore, RecordingSink, StaticReferences, UnreachableReferences};

fn open(sink: &Arc<RecordingSink>) -> WizardSession {
    WizardSession::create(reference_data(), sink.clone())
}

/// Fill every step with valid data, advancing as we go, and stop on the
/// final step.
fn fill_and_advance(wizard: &mut WizardSession) {
    let changes = [
        FieldChange::SetName {
            name: "Clean water for rural schools".to_string(),
        },
        FieldChange::SetManager { manager: Some(1) },
        FieldChange::SetBudgetTotal { amount: d("1000") },
        FieldChange::SetStartDate {
            date: Some("2024-01-01".parse().unwrap()),
        },
        FieldChange::SetEndDate {
            date: Some("2024-12-31".parse().unwrap()),
        },
    ];
    for change in changes {
        wizard.apply(change).expect("basic info change");
    }
    assert!(wizard.next().is_advanced());

    wizard
        .apply(FieldChange::SetGlobalObjectives { ids: vec![10] })
        .unwrap();
    wizard
        .apply(FieldChange::SetStrategicLines { ids: vec![20] })
        .unwrap();
    assert!(wizard.next().is_advanced());

    wizard
        .apply(FieldChange::AddDonor {
            donor_ref: 30,
            amount: d("600"),
        })
        .unwrap();
    wizard
        .apply(FieldChange::AddDonor {
            donor_ref: 31,
            amount: d("400"),
        })
        .unwrap();
    assert!(wizard.next().is_advanced());

    wizard
        .apply(FieldChange::AddLocation {
            location: Location {
                department: "Cauca".to_string(),
                municipality: "Popayán".to_string(),
                locality: "La Vega".to_string(),
                priority: 2,
            },
        })
        .unwrap();
    assert!(wizard.next().is_advanced());

    wizard
        .apply(FieldChange::AddActivity {
            name: "Drill wells".to_string(),
            budget_assigned: d("700"),
        })
        .unwrap();
    assert!(wizard.next().is_advanced());
    assert!(wizard.next().is_advanced());
    assert_eq!(wizard.current_step(), MAX_STEP);
}

// -- Create flow --

#[tokio::test]
async fn create_flow_submits_and_completes() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::default();
    let mut wizard = open(&sink);
    fill_and_advance(&mut wizard);

    let stored = wizard.submit(&store, &session()).await.expect("submit");

    assert_eq!(stored.id, 100);
    assert_eq!(wizard.status(), WizardStatus::Completed);
    assert_eq!(store.saved_count(), 1);
    let (id, payload) = store.saved.lock().unwrap()[0].clone();
    assert_eq!(id, None);
    assert_eq!(payload.donors[0].percentage, d("60"));
    assert_eq!(payload.donors[1].percentage, d("40"));
    assert_eq!(sink.levels().last(), Some(&NotificationLevel::Success));
}

#[tokio::test]
async fn completed_wizard_cannot_submit_twice() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::default();
    let mut wizard = open(&sink);
    fill_and_advance(&mut wizard);
    wizard.submit(&store, &session()).await.unwrap();

    let again = wizard.submit(&store, &session()).await;
    assert_matches!(again, Err(ClientError::Core(_)));
    assert_eq!(store.saved_count(), 1);
}

// -- Guards and gate --

#[tokio::test]
async fn over_allocation_is_rejected_and_notified() {
    let sink = Arc::new(RecordingSink::default());
    let mut wizard = open(&sink);
    wizard
        .apply(FieldChange::SetBudgetTotal { amount: d("1000") })
        .unwrap();
    wizard
        .apply(FieldChange::AddActivity {
            name: "Training".to_string(),
            budget_assigned: d("600"),
        })
        .unwrap();

    let result = wizard.apply(FieldChange::AddActivity {
        name: "Supplies".to_string(),
        budget_assigned: d("500"),
    });

    assert_matches!(result, Err(ChangeRejected::OverAllocation { .. }));
    assert_eq!(wizard.draft().activities.len(), 1);
    assert_eq!(sink.count(NotificationLevel::Warning), 1);
}

#[tokio::test]
async fn blocked_step_reports_fields_and_warns() {
    let sink = Arc::new(RecordingSink::default());
    let mut wizard = open(&sink);

    let outcome = wizard.next();

    assert_matches!(&outcome, StepOutcome::Blocked { step: 1, errors } => {
        assert!(errors.contains("name"));
        assert!(errors.contains("budget_total"));
    });
    assert_eq!(wizard.current_step(), 1);
    assert_eq!(sink.count(NotificationLevel::Warning), 1);
}

#[tokio::test]
async fn submit_before_final_step_is_blocked() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::default();
    let mut wizard = open(&sink);

    let result = wizard.submit(&store, &session()).await;

    assert_matches!(
        result,
        Err(ClientError::Blocked(SubmitBlocked::NotOnFinalStep { current: 1 }))
    );
    assert_eq!(store.saved_count(), 0);
    assert_eq!(wizard.status(), WizardStatus::InProgress);
}

#[tokio::test]
async fn earlier_step_edited_after_passing_blocks_submit() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::default();
    let mut wizard = open(&sink);
    fill_and_advance(&mut wizard);

    // Raising the budget breaks the donor sum without touching step 3.
    wizard
        .apply(FieldChange::SetBudgetTotal { amount: d("2000") })
        .unwrap();
    let result = wizard.submit(&store, &session()).await;

    assert_matches!(result, Err(ClientError::Blocked(SubmitBlocked::Invalid(report))) => {
        assert!(report.contains("donors"));
    });
    assert_eq!(store.saved_count(), 0);
}

// -- Remote failures --

#[tokio::test]
async fn rejected_submission_keeps_draft_and_step() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::rejecting(400, "A project with this name already exists");
    let mut wizard = open(&sink);
    fill_and_advance(&mut wizard);
    let before = wizard.draft().clone();

    let result = wizard.submit(&store, &session()).await;

    assert_matches!(result, Err(ClientError::Api { status: 400, .. }));
    assert_eq!(wizard.draft(), &before);
    assert_eq!(wizard.current_step(), MAX_STEP);
    assert_eq!(wizard.status(), WizardStatus::InProgress);
    assert_eq!(
        sink.messages().last().map(String::as_str),
        Some("A project with this name already exists")
    );
    assert_eq!(sink.levels().last(), Some(&NotificationLevel::Error));

    store.accept_again();
    assert!(wizard.submit(&store, &session()).await.is_ok());
}

#[tokio::test]
async fn ended_session_cannot_submit() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::default();
    let mut wizard = open(&sink);
    fill_and_advance(&mut wizard);
    let session: Session = session();
    session.end();

    let result = wizard.submit(&store, &session).await;

    assert_matches!(result, Err(ClientError::SessionEnded));
    assert_eq!(store.saved_count(), 0);
}

#[tokio::test]
async fn unreachable_reference_data_degrades() {
    let sink = Arc::new(RecordingSink::default());
    let wizard = WizardSession::start_with(&UnreachableReferences, &session(), sink.clone()).await;

    assert!(wizard.reference_data().degraded);
    assert!(wizard.reference_data().donors.is_empty());
    assert_eq!(sink.count(NotificationLevel::Warning), 1);
    assert_eq!(wizard.status(), WizardStatus::InProgress);
}

// -- Edit flow --

#[tokio::test]
async fn edit_flow_updates_existing_project() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::default();
    let mut creator = open(&sink);
    fill_and_advance(&mut creator);
    let stored = creator.submit(&store, &session()).await.unwrap();

    let source = StaticReferences(reference_data());
    let mut editor = WizardSession::edit_with(&source, &session(), &stored, sink.clone()).await;
    assert_eq!(editor.mode(), WizardMode::Edit { project_id: 100 });
    assert_eq!(editor.draft().donors[0].percentage, d("60"));

    // Stored fixture drops objectives; restore them so step 2 passes.
    editor.apply(FieldChange::SetGlobalObjectives { ids: vec![10] }).unwrap();
    editor.apply(FieldChange::SetStrategicLines { ids: vec![20] }).unwrap();
    editor
        .apply(FieldChange::SetStatus {
            status: ProjectStatus::InProgress,
        })
        .unwrap();
    for _ in 1..MAX_STEP {
        assert!(editor.next().is_advanced());
    }

    let updated = editor.submit(&store, &session()).await.unwrap();
    assert_eq!(updated.id, 100);
    assert_eq!(updated.status, ProjectStatus::InProgress);
    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.last().map(|(id, _)| *id), Some(Some(100)));
}

// -- Evidence --

#[tokio::test]
async fn evidence_intake_attaches_only_accepted_files() {
    let sink = Arc::new(RecordingSink::default());
    let mut wizard = open(&sink);
    let candidate = |name: &str, mime: &str, size: u64| CandidateFile {
        file_name: name.to_string(),
        mime_type: Some(mime.to_string()),
        size_bytes: size,
        source: EvidenceSource::Inline {
            bytes: vec![0; 4],
        },
    };

    let report = wizard.add_evidence(vec![
        candidate("photo.png", "image/png", 6 * 1024 * 1024),
        candidate("notes.txt", "text/plain", 2 * 1024 * 1024),
        candidate("report.pdf", "application/pdf", 2 * 1024 * 1024),
    ]);

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(wizard.draft().evidence_files.len(), 1);
    assert_eq!(wizard.draft().evidence_files[0].file_name, "report.pdf");
    assert_eq!(sink.count(NotificationLevel::Warning), 2);
}

#[tokio::test]
async fn evidence_intake_attaches_every_valid_file_quietly() {
    let sink = Arc::new(RecordingSink::default());
    let mut wizard = open(&sink);
    let candidate = |name: &str, mime: Option<&str>| CandidateFile {
        file_name: name.to_string(),
        mime_type: mime.map(str::to_string),
        size_bytes: 1024,
        source: EvidenceSource::Inline { bytes: vec![0; 4] },
    };

    let report = wizard.add_evidence(vec![
        candidate("site.jpg", Some("image/jpeg")),
        candidate("budget.pdf", None),
    ]);

    assert_eq!(report.accepted.len(), 2);
    assert!(report.rejected.is_empty());
    let attached: Vec<&str> = wizard
        .draft()
        .evidence_files
        .iter()
        .map(|f| f.file_name.as_str())
        .collect();
    assert_eq!(attached, vec!["site.jpg", "budget.pdf"]);
    assert!(sink.levels().is_empty());
}

#[tokio::test]
async fn abandon_discards_without_saving() {
    let sink = Arc::new(RecordingSink::default());
    let store = InMemoryStore::default();
    let mut wizard = open(&sink);
    fill_and_advance(&mut wizard);

    assert_eq!(wizard.abandon(), WizardStatus::Abandoned);
    assert_eq!(store.saved_count(), 0);
}
