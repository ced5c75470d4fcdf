//! Project wizard consistency engine.
//!
//! Pure logic with no I/O: the project draft model, allocation arithmetic,
//! field validation, the change reducer, the wizard step gate, evidence
//! intake, and the supporting reference-data, catalog, demographics,
//! filtering, and summary helpers.

pub mod allocation;
pub mod catalog;
pub mod change;
pub mod demographics;
pub mod draft;
pub mod error;
pub mod evidence;
pub mod filter;
pub mod reference;
pub mod summary;
pub mod types;
pub mod validation;
pub mod wizard;
