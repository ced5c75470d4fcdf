//! `pmis-draft-check`: validate stored projects offline.
//!
//! Reads a JSON file holding one stored project (or an array of them),
//! hydrates each into a draft, and prints a per-step validation report and
//! summary as JSON on stdout. Exits with status 1 when any step fails.
//!
//! When `PMIS_ACCESS_TOKEN` and `PMIS_USER_ID` are set, pick-lists are
//! fetched from `PMIS_API_URL` so references are checked too.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use pmis_client::config::ClientConfig;
use pmis_client::session::{Credentials, Session};
use pmis_client::store::RestClient;
use pmis_client::telemetry;
use pmis_client::wizard_session::load_reference_data;
use pmis_core::draft::{ProjectDraft, StoredProject};
use pmis_core::reference::ReferenceData;
use pmis_core::summary::{PortfolioSummary, ProjectSummary};
use pmis_core::wizard::{validate_step, WizardStep, MAX_STEP, MIN_STEP};
use pmis_events::NotificationBus;
use serde::Serialize;

#[derive(Serialize)]
struct StepReport {
    step: u8,
    label: &'static str,
    passed: bool,
    errors: pmis_core::validation::FieldReport,
}

#[derive(Serialize)]
struct ProjectReport {
    project_id: i64,
    name: String,
    valid: bool,
    steps: Vec<StepReport>,
    summary: ProjectSummary,
}

#[derive(Serialize)]
struct CheckOutput {
    projects: Vec<ProjectReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    portfolio: Option<PortfolioSummary>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(std::env::var("PMIS_LOG_JSON").is_ok_and(|v| v == "1"));

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "Draft check failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every project passed.
async fn run() -> anyhow::Result<bool> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: pmis-draft-check <project.json>")?;

    let config = ClientConfig::from_env()?;
    tracing::info!(api_url = %config.api_url, path = %path.display(), "Checking stored projects");

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;
    let many = value.is_array();
    let projects: Vec<StoredProject> = if many {
        serde_json::from_value(value).context("Expected an array of stored projects")?
    } else {
        vec![serde_json::from_value(value).context("Expected a stored project")?]
    };

    let refs = reference_data(&config).await?;

    let reports: Vec<ProjectReport> = projects.iter().map(|p| check_project(p, &refs)).collect();
    let all_valid = reports.iter().all(|r| r.valid);

    let output = CheckOutput {
        projects: reports,
        portfolio: many.then(|| PortfolioSummary::from_projects(&projects)),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(all_valid)
}

async fn reference_data(config: &ClientConfig) -> anyhow::Result<ReferenceData> {
    let (Ok(token), Ok(user_id)) = (
        std::env::var("PMIS_ACCESS_TOKEN"),
        std::env::var("PMIS_USER_ID"),
    ) else {
        tracing::debug!("No credentials configured; reference checks skipped");
        return Ok(ReferenceData::degraded());
    };

    let user_id = user_id
        .trim()
        .parse()
        .context("PMIS_USER_ID must be an integer")?;
    let bus = Arc::new(NotificationBus::default());
    let session = Session::from_config(
        Credentials {
            access_token: token,
            user_id,
        },
        config,
        Arc::clone(&bus),
    );
    let client = RestClient::new(config)?;
    let refs = load_reference_data(&client, &session, bus.as_ref()).await;
    session.end();
    Ok(refs)
}

fn check_project(stored: &StoredProject, refs: &ReferenceData) -> ProjectReport {
    let draft = ProjectDraft::hydrate(stored);
    let steps: Vec<StepReport> = (MIN_STEP..=MAX_STEP)
        .filter_map(|n| WizardStep::from_number(n).ok())
        .map(|step| {
            let errors = validate_step(step, &draft, refs);
            StepReport {
                step: step.to_number(),
                label: step.label(),
                passed: errors.is_empty(),
                errors,
            }
        })
        .collect();
    let valid = steps.iter().all(|s| s.passed);
    if !valid {
        tracing::warn!(project_id = stored.id, "Project has validation errors");
    }

    ProjectReport {
        project_id: stored.id,
        name: stored.name.clone(),
        valid,
        steps,
        summary: ProjectSummary::from_draft(&draft),
    }
}
