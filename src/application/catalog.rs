//! Catalogs for the enum-constrained fields (university, year, position).
//!
//! The default catalog matches the chapter's current recruitment drive.
//! Deployments override it through [`Config::catalog`](crate::Config::catalog).

use serde::{Deserialize, Serialize};

use crate::application::types::Field;

/// One selectable catalog value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stored/transmitted value.
    pub value: String,
    /// Human-readable label.
    pub label: String,
}

impl CatalogEntry {
    /// Creates an entry with distinct value and label.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Creates an entry whose label equals its value.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Allowed values for the catalog-constrained fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Participating universities.
    pub universities: Vec<CatalogEntry>,
    /// Academic years.
    pub years: Vec<CatalogEntry>,
    /// Open team positions.
    pub positions: Vec<CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            universities: ["VIT", "VSIT", "VIIE"]
                .into_iter()
                .map(CatalogEntry::plain)
                .collect(),
            years: vec![
                CatalogEntry::new("1st", "1st Year"),
                CatalogEntry::new("2nd", "2nd Year"),
                CatalogEntry::new("3rd", "3rd Year"),
                CatalogEntry::new("4th", "4th Year"),
            ],
            positions: [
                "Technical Team",
                "Finance Team",
                "Open-Source Team",
                "Documentation Team",
                "Media Team",
                "Event Management Team",
                "UI/UX Team",
                "Events & Outreach",
                "Design",
            ]
            .into_iter()
            .map(CatalogEntry::plain)
            .collect(),
        }
    }
}

impl Catalog {
    /// Returns the entries constraining `field`, or `None` for free-text fields.
    pub fn entries(&self, field: Field) -> Option<&[CatalogEntry]> {
        match field {
            Field::University => Some(&self.universities),
            Field::Year => Some(&self.years),
            Field::Position => Some(&self.positions),
            _ => None,
        }
    }

    /// Returns true if `value` is an allowed value for `field`.
    ///
    /// Free-text fields accept any value. Matching is exact.
    pub fn allows(&self, field: Field, value: &str) -> bool {
        match self.entries(field) {
            Some(entries) => entries.iter().any(|e| e.value == value),
            None => true,
        }
    }

    /// Returns the display label for a catalog value, if it exists.
    pub fn label(&self, field: Field, value: &str) -> Option<&str> {
        self.entries(field)?
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.label.as_str())
    }

    /// Returns true if any constrained field has no allowed values.
    pub fn has_empty_list(&self) -> bool {
        self.universities.is_empty() || self.years.is_empty() || self.positions.is_empty()
    }
}
