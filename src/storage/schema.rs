//! Embedded store schema definitions and versioning.
//!
//! All table definitions are compile-time constants to ensure consistency.
//!
//! # Schema Versioning
//!
//! The schema version is stored in the metadata table. Opening a file
//! written with a different version fails with
//! [`StorageError::SchemaVersionMismatch`](crate::error::StorageError::SchemaVersionMismatch).
//!
//! # Table Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ METADATA_TABLE                                               │
//! │   Key: &str                                                  │
//! │   Value: &[u8] (bincode)                                     │
//! │   Entries: "db_metadata" -> DatabaseMetadata                 │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ APPLICATIONS_TABLE                                           │
//! │   Key: &[u8; 16] (ApplicationId as UUID v7 bytes)           │
//! │   Value: &[u8] (bincode-serialized Application)             │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ EMAIL_INDEX_TABLE (unique)                                   │
//! │   Key: &str (trimmed email)                                  │
//! │   Value: &[u8; 16] (ApplicationId)                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Current schema version.
///
/// Increment this when making breaking changes to the schema.
pub const SCHEMA_VERSION: u32 = 2;

/// Metadata table for store-level information.
pub const METADATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

/// Applications table.
///
/// Key: ApplicationId as 16-byte UUID. v7 ids sort by creation time.
/// Value: bincode-serialized Application
pub const APPLICATIONS_TABLE: TableDefinition<&[u8; 16], &[u8]> =
    TableDefinition::new("applications");

/// Unique index: trimmed email → ApplicationId.
///
/// A plain table (not a multimap), so one email maps to at most one row.
pub const EMAIL_INDEX_TABLE: TableDefinition<&str, &[u8; 16]> =
    TableDefinition::new("applications_by_email");

/// Store metadata, bincode-encoded under `"db_metadata"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Schema version for compatibility checking.
    pub schema_version: u32,

    /// When the store file was created.
    pub created_at: Timestamp,

    /// Last time the store was opened (updated on each open).
    pub last_opened_at: Timestamp,
}

impl DatabaseMetadata {
    /// Creates metadata for a fresh store.
    pub fn new() -> Self {
        let now = Timestamp::now();
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: now,
            last_opened_at: now,
        }
    }

    /// Updates the last_opened_at timestamp.
    pub fn touch(&mut self) {
        self.last_opened_at = Timestamp::now();
    }

    /// Checks if this metadata is compatible with the current schema.
    pub fn is_compatible(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

impl Default for DatabaseMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Key for the unique email index: the address as entered, trimmed.
///
/// Case is preserved, so `Jo@x.com` and `jo@x.com` are distinct entries.
#[inline]
pub fn email_key(email: &str) -> &str {
    email.trim()
}
