//! Input validation for application records.
//!
//! Validation is pure: no I/O, no hidden state. Every field is checked on
//! every call so the caller receives the complete error set in one pass.
//!
//! # Validation Layers
//!
//! ```text
//! FormController::submit()
//!     ├── validate()                 ← per-field rules, never short-circuits
//!     ├── NetworkStatus::is_online()  ← only reached if valid
//!     └── SubmissionBackend::submit()
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::application::catalog::Catalog;
use crate::application::types::{ApplicationRecord, Field};
use crate::error::ValidationError;

/// Minimum trimmed length of `name`.
pub const MIN_NAME_LENGTH: usize = 2;

/// Minimum trimmed length of `skills`.
pub const MIN_SKILLS_LENGTH: usize = 10;

/// Minimum trimmed length of `motivation`.
pub const MIN_MOTIVATION_LENGTH: usize = 20;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Outcome of validating an [`ApplicationRecord`].
///
/// Holds one message per failing field. Ephemeral: recomputed on every
/// submit attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<Field, String>,
}

impl ValidationResult {
    /// Returns true iff no field failed.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Field → message for every failing field.
    #[inline]
    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    /// Message for a single field, if it failed.
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Converts into `Ok(())` or a [`ValidationError`] carrying all messages.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.errors))
        }
    }

    fn check(&mut self, field: Field, outcome: Option<&str>) {
        if let Some(message) = outcome {
            self.errors.insert(field, message.to_string());
        }
    }
}

/// Validates an [`ApplicationRecord`] against `catalog`.
///
/// # Rules
///
/// | Field | Constraint |
/// |-------|------------|
/// | `name` | Non-empty, trimmed length ≥ 2 |
/// | `email` | Non-empty, matches `local@domain.tld` |
/// | `university` | One of the catalog values |
/// | `year` | One of the catalog values |
/// | `position` | One of the catalog values |
/// | `skills` | Non-empty, trimmed length ≥ 10 |
/// | `experience` | None |
/// | `motivation` | Non-empty, trimmed length ≥ 20 |
///
/// Whitespace-only values count as empty. Lengths are counted in Unicode
/// scalar values.
pub fn validate(record: &ApplicationRecord, catalog: &Catalog) -> ValidationResult {
    let mut result = ValidationResult::default();

    result.check(
        Field::Name,
        check_min_length(
            &record.name,
            MIN_NAME_LENGTH,
            "Name is required",
            "Name must be at least 2 characters",
        ),
    );
    result.check(Field::Email, check_email(&record.email));
    result.check(
        Field::University,
        check_catalog(
            catalog,
            Field::University,
            &record.university,
            "Please select your university",
            "Please select a university from the list",
        ),
    );
    result.check(
        Field::Year,
        check_catalog(
            catalog,
            Field::Year,
            &record.year,
            "Please select your academic year",
            "Please select an academic year from the list",
        ),
    );
    result.check(
        Field::Position,
        check_catalog(
            catalog,
            Field::Position,
            &record.position,
            "Please select your preferred position",
            "Please select a position from the list",
        ),
    );
    result.check(
        Field::Skills,
        check_min_length(
            &record.skills,
            MIN_SKILLS_LENGTH,
            "Please describe your skills and interests",
            "Please provide more detail about your skills (at least 10 characters)",
        ),
    );
    // Experience is optional and has no depth requirement.
    result.check(
        Field::Motivation,
        check_min_length(
            &record.motivation,
            MIN_MOTIVATION_LENGTH,
            "This field is required",
            "Please provide more detail about your motivation (at least 20 characters)",
        ),
    );

    result
}

/// Returns true if `email` matches the accepted address pattern.
///
/// The raw value is matched, so surrounding whitespace fails.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn check_min_length(
    value: &str,
    min: usize,
    empty_message: &'static str,
    short_message: &'static str,
) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Some(empty_message)
    } else if trimmed.chars().count() < min {
        Some(short_message)
    } else {
        None
    }
}

fn check_email(email: &str) -> Option<&'static str> {
    if email.trim().is_empty() {
        Some("Email is required")
    } else if !is_valid_email(email) {
        Some("Please enter a valid email address")
    } else {
        None
    }
}

fn check_catalog(
    catalog: &Catalog,
    field: Field,
    value: &str,
    empty_message: &'static str,
    unknown_message: &'static str,
) -> Option<&'static str> {
    if value.trim().is_empty() {
        Some(empty_message)
    } else if !catalog.allows(field, value) {
        Some(unknown_message)
    } else {
        None
    }
}
