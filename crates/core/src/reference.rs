//! Reference-data snapshot the wizard validates against.
//!
//! Pick-lists (managers, objectives, strategic lines, donors, beneficiaries)
//! and the department → municipality taxonomy are fetched once when the
//! wizard opens and treated as read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draft::Location;
use crate::types::DbId;

/// Maximum number of locality suggestions returned for autocomplete.
pub const MAX_LOCALITY_SUGGESTIONS: usize = 10;

/// A single selectable entry in a pick-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickItem {
    pub id: DbId,
    pub name: String,
}

impl PickItem {
    pub fn new(id: DbId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// Department → municipalities taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoTaxonomy {
    departments: BTreeMap<String, Vec<String>>,
}

impl GeoTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a department with its municipalities, replacing any
    /// previous entry for the same department.
    pub fn with_department<I, S>(mut self, department: impl Into<String>, municipalities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.departments.insert(
            department.into(),
            municipalities.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn departments(&self) -> impl Iterator<Item = &str> {
        self.departments.keys().map(String::as_str)
    }

    /// Municipalities of `department`, empty when the department is unknown.
    pub fn municipalities_of(&self, department: &str) -> &[String] {
        self.departments
            .get(department)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_department(&self, department: &str) -> bool {
        self.departments.contains_key(department)
    }

    /// Whether `municipality` belongs to `department`.
    pub fn contains(&self, department: &str, municipality: &str) -> bool {
        self.municipalities_of(department)
            .iter()
            .any(|m| m == municipality)
    }
}

// ---------------------------------------------------------------------------
// ReferenceData
// ---------------------------------------------------------------------------

/// Read-only pick-list snapshot for one wizard session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub managers: Vec<PickItem>,
    #[serde(default)]
    pub global_objectives: Vec<PickItem>,
    #[serde(default)]
    pub strategic_lines: Vec<PickItem>,
    #[serde(default)]
    pub donors: Vec<PickItem>,
    #[serde(default)]
    pub beneficiaries: Vec<PickItem>,
    #[serde(default)]
    pub geography: GeoTaxonomy,
    /// Set when loading failed and the lists are empty placeholders.
    #[serde(default)]
    pub degraded: bool,
}

impl ReferenceData {
    /// Empty pick-lists used when the reference collaborator is unreachable.
    pub fn degraded() -> Self {
        Self {
            degraded: true,
            ..Self::default()
        }
    }

    /// Whether membership checks against the lists are meaningful.
    pub fn is_loaded(&self) -> bool {
        !self.degraded
    }

    pub fn has_manager(&self, id: DbId) -> bool {
        contains_id(&self.managers, id)
    }

    pub fn has_global_objective(&self, id: DbId) -> bool {
        contains_id(&self.global_objectives, id)
    }

    pub fn has_strategic_line(&self, id: DbId) -> bool {
        contains_id(&self.strategic_lines, id)
    }

    pub fn has_donor(&self, id: DbId) -> bool {
        contains_id(&self.donors, id)
    }

    pub fn has_beneficiary(&self, id: DbId) -> bool {
        contains_id(&self.beneficiaries, id)
    }
}

fn contains_id(items: &[PickItem], id: DbId) -> bool {
    items.iter().any(|item| item.id == id)
}

/// Distinct localities from prior records whose name starts with `prefix`
/// (case-insensitive), restricted to the given municipality when provided.
pub fn locality_suggestions<'a>(
    prefix: &str,
    municipality: Option<&str>,
    prior: &'a [Location],
) -> Vec<&'a str> {
    let needle = prefix.trim().to_lowercase();
    let mut out: Vec<&str> = Vec::new();
    for location in prior {
        if let Some(m) = municipality {
            if location.municipality != m {
                continue;
            }
        }
        let locality = location.locality.trim();
        if locality.is_empty() || !locality.to_lowercase().starts_with(&needle) {
            continue;
        }
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(locality)) {
            out.push(locality);
        }
        if out.len() == MAX_LOCALITY_SUGGESTIONS {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> GeoTaxonomy {
        GeoTaxonomy::new()
            .with_department("Cauca", ["Popayán", "Silvia"])
            .with_department("Nariño", ["Pasto"])
    }

    fn location(municipality: &str, locality: &str) -> Location {
        Location {
            department: "Cauca".to_string(),
            municipality: municipality.to_string(),
            locality: locality.to_string(),
            priority: 1,
        }
    }

    #[test]
    fn municipality_belongs_to_department() {
        let geo = taxonomy();
        assert!(geo.contains("Cauca", "Silvia"));
        assert!(!geo.contains("Nariño", "Silvia"));
        assert!(!geo.contains("Antioquia", "Medellín"));
    }

    #[test]
    fn unknown_department_has_no_municipalities() {
        assert!(taxonomy().municipalities_of("Atlántico").is_empty());
    }

    #[test]
    fn taxonomy_deserializes_from_plain_map() {
        let geo: GeoTaxonomy =
            serde_json::from_value(serde_json::json!({"Cauca": ["Popayán"]})).unwrap();
        assert!(geo.contains("Cauca", "Popayán"));
    }

    #[test]
    fn degraded_snapshot_is_empty_and_flagged() {
        let refs = ReferenceData::degraded();
        assert!(!refs.is_loaded());
        assert!(refs.managers.is_empty());
        assert!(refs.geography.is_empty());
    }

    #[test]
    fn membership_checks() {
        let refs = ReferenceData {
            managers: vec![PickItem::new(7, "Ana")],
            donors: vec![PickItem::new(11, "Fund A")],
            ..ReferenceData::default()
        };
        assert!(refs.has_manager(7));
        assert!(!refs.has_manager(8));
        assert!(refs.has_donor(11));
        assert!(!refs.has_beneficiary(11));
    }

    #[test]
    fn locality_suggestions_are_prefix_matched_and_distinct() {
        let prior = vec![
            location("Popayán", "La Vega"),
            location("Popayán", "la vega"),
            location("Popayán", "Lomas"),
            location("Silvia", "La Loma"),
            location("Popayán", "Centro"),
        ];
        let all = locality_suggestions("la", None, &prior);
        assert_eq!(all, vec!["La Vega", "La Loma"]);

        let scoped = locality_suggestions("L", Some("Popayán"), &prior);
        assert_eq!(scoped, vec!["La Vega", "Lomas"]);
    }
}
