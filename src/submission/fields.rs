//! Logical field → wire key tables.
//!
//! Each backend names the eight fields differently on the wire. The tables
//! are data, not code, so a redeployed form only needs a new table.

use crate::application::{ApplicationRecord, Field};

/// Static mapping from [`Field`] to the key a backend expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMap {
    entries: &'static [(Field, &'static str)],
}

/// JSON relay and database columns: the logical names.
pub static RELAY_FIELD_MAP: FieldMap = FieldMap::new(&[
    (Field::Name, "name"),
    (Field::Email, "email"),
    (Field::University, "university"),
    (Field::Year, "year"),
    (Field::Position, "position"),
    (Field::Skills, "skills"),
    (Field::Experience, "experience"),
    (Field::Motivation, "motivation"),
]);

/// Entry ids of the deployed hosted form.
pub static FORM_FIELD_MAP: FieldMap = FieldMap::new(&[
    (Field::Name, "entry.999979218"),
    (Field::Email, "entry.1727574457"),
    (Field::University, "entry.2135975318"),
    (Field::Year, "entry.194244693"),
    (Field::Position, "entry.2001488712"),
    (Field::Skills, "entry.1173118307"),
    (Field::Experience, "entry.1777570729"),
    (Field::Motivation, "entry.103579658"),
]);

impl FieldMap {
    /// Creates a map from a static table.
    pub const fn new(entries: &'static [(Field, &'static str)]) -> Self {
        Self { entries }
    }

    /// Wire key for `field`, if the table maps it.
    pub fn key_for(&self, field: Field) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, key)| *key)
    }

    /// Key/value pairs for every mapped field, in table order.
    ///
    /// With `trim`, values are trimmed; otherwise they are sent as entered.
    pub fn encode(&self, record: &ApplicationRecord, trim: bool) -> Vec<(&'static str, String)> {
        self.entries
            .iter()
            .map(|(field, key)| {
                let value = record.get(*field);
                let value = if trim { value.trim() } else { value };
                (*key, value.to_string())
            })
            .collect()
    }

    /// All `(field, key)` pairs.
    pub fn entries(&self) -> &'static [(Field, &'static str)] {
        self.entries
    }
}
