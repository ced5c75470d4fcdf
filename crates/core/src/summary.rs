//! Read-only rollups for a single project and for a project portfolio.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation;
use crate::draft::{ProjectDraft, StoredProject};
use crate::types::Money;

/// Figures shown on the project's review step and detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub donor_count: usize,
    pub activity_count: usize,
    pub location_count: usize,
    pub evidence_count: usize,
    /// Distinct beneficiaries linked across all activities.
    pub beneficiary_count: usize,
    pub budget_total: Money,
    pub donor_total: Money,
    pub activity_total: Money,
    pub unassigned_budget: Money,
    pub overall_progress: Decimal,
    /// `budget_executed / budget_total * 100`.
    pub executed_percentage: Decimal,
}

impl ProjectSummary {
    pub fn from_draft(draft: &ProjectDraft) -> Self {
        let beneficiaries: BTreeSet<_> = draft
            .activities
            .iter()
            .flat_map(|a| a.beneficiary_links.iter().copied())
            .collect();

        Self {
            donor_count: draft.donors.len(),
            activity_count: draft.activities.len(),
            location_count: draft.locations.len(),
            evidence_count: draft.evidence_files.len(),
            beneficiary_count: beneficiaries.len(),
            budget_total: draft.budget_total,
            donor_total: draft.donor_total(),
            activity_total: draft.activity_total(),
            unassigned_budget: draft.unassigned_budget(),
            overall_progress: draft.overall_progress(),
            executed_percentage: allocation::percentage_of(
                draft.budget_executed,
                draft.budget_total,
            ),
        }
    }
}

/// Totals across many projects for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub project_count: usize,
    /// Project count keyed by status string.
    pub by_status: BTreeMap<String, usize>,
    pub total_budget: Money,
    pub total_executed: Money,
    /// `total_executed / total_budget * 100`.
    pub execution_rate: Decimal,
    /// Plain mean of each project's overall progress.
    pub average_progress: Decimal,
}

impl PortfolioSummary {
    pub fn from_projects(projects: &[StoredProject]) -> Self {
        if projects.is_empty() {
            return Self::default();
        }

        let mut by_status = BTreeMap::new();
        for p in projects {
            *by_status.entry(p.status.as_str().to_string()).or_insert(0) += 1;
        }

        let total_budget = allocation::allocated_sum(projects.iter().map(|p| p.budget_total));
        let total_executed = allocation::allocated_sum(projects.iter().map(|p| p.budget_executed));
        let progress_sum: Decimal = projects.iter().map(|p| p.overall_progress).sum();
        let average_progress = (progress_sum / Decimal::from(projects.len()))
            .round_dp(allocation::PERCENT_SCALE);

        Self {
            project_count: projects.len(),
            by_status,
            total_budget,
            total_executed,
            execution_rate: allocation::percentage_of(total_executed, total_budget),
            average_progress,
        }
    }
}
