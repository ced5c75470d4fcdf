//! Validation result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of validating one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldCheck {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Failing fields keyed by canonical field name, in stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldReport {
    errors: BTreeMap<String, String>,
}

impl FieldReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `check` under `field`; passing checks are ignored.
    pub fn record(&mut self, field: impl Into<String>, check: FieldCheck) {
        if check.is_valid {
            return;
        }
        let message = check
            .message
            .unwrap_or_else(|| "Invalid value".to_string());
        self.errors.insert(field.into(), message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All messages joined into a single line for a notification.
    pub fn summary(&self) -> String {
        self.errors
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
