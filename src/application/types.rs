//! Type definitions for applications.
//!
//! An [`ApplicationRecord`] is the working copy the applicant edits. Once a
//! direct-write backend stores it, it becomes an [`Application`] with an id
//! and timestamps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ApplicationId, Timestamp};

/// The logical fields of an application form.
///
/// Declaration order is display order; error maps keyed by `Field` iterate
/// in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Applicant's full name.
    Name,
    /// Contact email, also the duplicate-detection key.
    Email,
    /// University, constrained to the catalog.
    University,
    /// Academic year, constrained to the catalog.
    Year,
    /// Preferred team, constrained to the catalog.
    Position,
    /// Skills and interests (free text).
    Skills,
    /// Prior experience (free text, optional).
    Experience,
    /// Why the applicant wants to join (free text).
    Motivation,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::Email,
        Field::University,
        Field::Year,
        Field::Position,
        Field::Skills,
        Field::Experience,
        Field::Motivation,
    ];

    /// Returns the logical field name (`"name"`, `"email"`, ...).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::University => "university",
            Field::Year => "year",
            Field::Position => "position",
            Field::Skills => "skills",
            Field::Experience => "experience",
            Field::Motivation => "motivation",
        }
    }

    /// Looks up a field by its logical name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applicant data as collected by the form.
///
/// All fields are raw strings exactly as entered; trimming happens during
/// validation and (for some channels) during encoding, never in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationRecord {
    /// Applicant's full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// University catalog value.
    pub university: String,
    /// Academic year catalog value.
    pub year: String,
    /// Position catalog value.
    pub position: String,
    /// Skills and interests.
    pub skills: String,
    /// Prior experience (may be empty).
    pub experience: String,
    /// Motivation statement.
    pub motivation: String,
}

impl ApplicationRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of a field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::University => &self.university,
            Field::Year => &self.year,
            Field::Position => &self.position,
            Field::Skills => &self.skills,
            Field::Experience => &self.experience,
            Field::Motivation => &self.motivation,
        }
    }

    /// Replaces the value of a field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::University => self.university = value,
            Field::Year => self.year = value,
            Field::Position => self.position = value,
            Field::Skills => self.skills = value,
            Field::Experience => self.experience = value,
            Field::Motivation => self.motivation = value,
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Returns true if every field is empty.
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    /// Resets every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns the email with its local part masked, for logs.
    pub fn masked_email(&self) -> String {
        mask_email(&self.email)
    }
}

/// Masks the local part of an email address (`jane@x.com` → `j***@x.com`).
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            match (chars.next(), chars.next()) {
                (Some(first), Some(_)) => format!("{}***@{}", first, domain),
                _ => format!("{}@{}", "*".repeat(local.chars().count()), domain),
            }
        }
        None => "***@***".to_string(),
    }
}

/// A stored application, as returned by a direct-write backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Backend-assigned identifier.
    pub id: ApplicationId,

    /// The submitted fields.
    pub record: ApplicationRecord,

    /// When the backend stored the application.
    pub created_at: Timestamp,

    /// When the row was last modified. Equal to `created_at`; this crate
    /// never mutates a submitted application.
    pub updated_at: Timestamp,
}

impl Application {
    /// Wraps a record with a fresh id and the current time.
    pub fn new(record: ApplicationRecord) -> Self {
        let now = Timestamp::now();
        Self {
            id: ApplicationId::new(),
            record,
            created_at: now,
            updated_at: now,
        }
    }
}
