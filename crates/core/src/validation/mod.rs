//! Field validation for the project draft.
//!
//! Rules are looked up by [`Field`] and evaluated against the whole draft,
//! producing a [`FieldCheck`] per field. Failures are returned as data and
//! never raised as errors.

pub mod evaluator;
pub mod fields;
pub mod rules;

pub use evaluator::{validate_field, validate_field_with, validate_fields, validate_named};
pub use fields::Field;
pub use rules::{FieldCheck, FieldReport};
