//! Application records, catalogs, and validation.
//!
//! An **application** is what a prospective member submits: name, contact
//! email, university, academic year, preferred position, skills, optional
//! experience, and motivation.
//!
//! # Operations
//!
//! - [`validate(record, catalog)`](validate): pure per-field validation
//! - [`Catalog`]: allowed values for university, year, and position
//!
//! Submission is handled by [`FormController`](crate::FormController) and the
//! backends in [`submission`](crate::submission).

pub mod catalog;
pub mod types;
pub mod validation;

pub use catalog::{Catalog, CatalogEntry};
pub use types::{mask_email, Application, ApplicationRecord, Field};
pub use validation::{
    is_valid_email, validate, ValidationResult, MIN_MOTIVATION_LENGTH, MIN_NAME_LENGTH,
    MIN_SKILLS_LENGTH,
};
