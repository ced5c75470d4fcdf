//! In-memory filtering for catalog and project lists.
//!
//! A query is split into whitespace terms; a record matches when every term
//! appears (case-insensitively) in at least one of its searchable fields and
//! it carries every requested tag.

use serde::{Deserialize, Serialize};

use crate::catalog::{BeneficiaryForm, CatalogEntry};
use crate::draft::StoredProject;
use crate::reference::PickItem;

/// A record that can be matched by [`RecordFilter`].
pub trait Filterable {
    /// Fields searched by free text.
    fn search_fields(&self) -> Vec<&str>;

    fn tags(&self) -> &[String] {
        &[]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Split a query into lowercase terms, trimming punctuation at the edges.
fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl RecordFilter {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        query_terms(&self.text).is_empty() && self.tags.is_empty()
    }

    pub fn matches<T: Filterable + ?Sized>(&self, record: &T) -> bool {
        let record_tags = record.tags();
        let has_tags = self
            .tags
            .iter()
            .all(|want| record_tags.iter().any(|t| t.eq_ignore_ascii_case(want)));
        if !has_tags {
            return false;
        }

        let haystack: Vec<String> = record
            .search_fields()
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        query_terms(&self.text)
            .iter()
            .all(|term| haystack.iter().any(|field| field.contains(term.as_str())))
    }

    /// Matching records in input order.
    pub fn apply<'a, T: Filterable>(&self, records: &'a [T]) -> Vec<&'a T> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

impl Filterable for PickItem {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Filterable for StoredProject {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.description.as_str()];
        if let Some(manager) = &self.assigned_manager {
            fields.push(&manager.name);
        }
        fields.extend(self.locations.iter().map(|l| l.municipality.as_str()));
        fields
    }
}

impl Filterable for BeneficiaryForm {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.document_id.as_str(),
        ];
        if let Some(m) = &self.municipality {
            fields.push(m);
        }
        fields
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Filterable for CatalogEntry {
    fn search_fields(&self) -> Vec<&str> {
        match self {
            Self::GlobalObjective(f) => vec![f.name.as_str(), f.description.as_str()],
            Self::StrategicLine(f) => vec![f.name.as_str(), f.description.as_str()],
            Self::Donor(f) => {
                let mut fields = vec![f.name.as_str()];
                fields.extend(f.contact_email.as_deref());
                fields.extend(f.country.as_deref());
                fields
            }
            Self::Beneficiary(f) => f.search_fields(),
        }
    }

    fn tags(&self) -> &[String] {
        match self {
            Self::Beneficiary(f) => f.tags.as_slice(),
            _ => &[],
        }
    }
}
