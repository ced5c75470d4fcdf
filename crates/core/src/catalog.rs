//! Catalog entries managed outside the wizard: global objectives, strategic
//! lines, donors, and beneficiaries.
//!
//! Each kind carries its own form type; [`CatalogEntry`] dispatches over them
//! with an exhaustive match.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::DbId;

/// Phone numbers: optional leading `+`, then 7–15 digits with spaces or
/// dashes between groups.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("valid regex"));

/// National identity documents: 4–20 letters, digits, or dashes.
static DOCUMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z\-]{4,20}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GlobalObjectiveForm {
    #[validate(length(min = 3, max = 200, message = "name must be 3 to 200 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StrategicLineForm {
    #[validate(length(min = 3, max = 200, message = "name must be 3 to 200 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    /// Objective this line contributes to, if any.
    #[serde(default)]
    pub global_objective: Option<DbId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DonorForm {
    #[validate(length(min = 2, max = 150, message = "name must be 2 to 150 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "contact email is not a valid address"))]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BeneficiaryForm {
    #[validate(length(min = 1, max = 100, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,
    pub document_id: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BeneficiaryForm {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

// ---------------------------------------------------------------------------
// CatalogKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    GlobalObjective,
    StrategicLine,
    Donor,
    Beneficiary,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlobalObjective => "global_objective",
            Self::StrategicLine => "strategic_line",
            Self::Donor => "donor",
            Self::Beneficiary => "beneficiary",
        }
    }

    /// REST collection path for this kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::GlobalObjective => "global-objectives",
            Self::StrategicLine => "strategic-lines",
            Self::Donor => "donors",
            Self::Beneficiary => "beneficiaries",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::GlobalObjective => "Global objective",
            Self::StrategicLine => "Strategic line",
            Self::Donor => "Donor",
            Self::Beneficiary => "Beneficiary",
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogEntry
// ---------------------------------------------------------------------------

/// One catalog record of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogEntry {
    GlobalObjective(GlobalObjectiveForm),
    StrategicLine(StrategicLineForm),
    Donor(DonorForm),
    Beneficiary(BeneficiaryForm),
}

impl CatalogEntry {
    pub fn kind(&self) -> CatalogKind {
        match self {
            Self::GlobalObjective(_) => CatalogKind::GlobalObjective,
            Self::StrategicLine(_) => CatalogKind::StrategicLine,
            Self::Donor(_) => CatalogKind::Donor,
            Self::Beneficiary(_) => CatalogKind::Beneficiary,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::GlobalObjective(f) => f.name.trim().to_string(),
            Self::StrategicLine(f) => f.name.trim().to_string(),
            Self::Donor(f) => f.name.trim().to_string(),
            Self::Beneficiary(f) => f.full_name(),
        }
    }

    /// Validate the form for this entry's kind. `today` bounds birth dates.
    pub fn validate_entry(&self, today: NaiveDate) -> Result<(), CoreError> {
        let derived = match self {
            Self::GlobalObjective(f) => f.validate(),
            Self::StrategicLine(f) => f.validate(),
            Self::Donor(f) => f.validate(),
            Self::Beneficiary(f) => f.validate(),
        };
        derived.map_err(|e| {
            CoreError::Validation(format!("{} is invalid: {e}", self.kind().label()))
        })?;

        match self {
            Self::GlobalObjective(_) | Self::StrategicLine(_) => Ok(()),
            Self::Donor(f) => check_phone(f.phone.as_deref()),
            Self::Beneficiary(f) => {
                if !DOCUMENT_RE.is_match(f.document_id.trim()) {
                    return Err(CoreError::Validation(format!(
                        "Document id '{}' must be 4 to 20 letters, digits or dashes",
                        f.document_id
                    )));
                }
                if let Some(birth) = f.birth_date {
                    if birth > today {
                        return Err(CoreError::Validation(
                            "Birth date cannot be in the future".to_string(),
                        ));
                    }
                }
                check_phone(f.phone.as_deref())
            }
        }
    }
}

fn check_phone(phone: Option<&str>) -> Result<(), CoreError> {
    match phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if !PHONE_RE.is_match(p) => Err(CoreError::Validation(format!(
            "Phone number '{p}' is not valid"
        ))),
        _ => Ok(()),
    }
}
