//! Error types for recruit.
//!
//! recruit uses a hierarchical error system:
//! - `RecruitError` is the top-level error returned by all public APIs
//! - Specific error types (`ValidationError`, `TransportError`, `StorageError`)
//!   provide detail
//! - [`RecruitError::kind`] collapses everything into the user-facing
//!   categories the form controller reports on
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use recruit::{Config, FormController, Result};
//!
//! async fn example(controller: &FormController) -> Result<()> {
//!     let ack = controller.backend().submit(&record).await?;
//!     println!("delivered: {}", ack);
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::application::Field;

/// Result type alias for recruit operations.
pub type Result<T> = std::result::Result<T, RecruitError>;

/// Top-level error enum for all recruit operations.
///
/// This is the only error type returned by public APIs.
/// Use [`kind()`](Self::kind) to decide what to tell the applicant.
#[derive(Debug, Error)]
pub enum RecruitError {
    /// One or more fields failed local validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The active backend is missing credentials or has placeholder values.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// No network path at submit time.
    #[error("No network connection")]
    Offline,

    /// The submission collides with an existing record.
    #[error("Conflict on '{field}': {message}")]
    Conflict {
        /// The field the conflict is attributed to.
        field: Field,
        /// Applicant-facing message.
        message: String,
    },

    /// Timeout or network failure during a call.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a non-success status.
    #[error("Submission rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the backend, or the status reason.
        message: String,
    },

    /// Local store error (embedded direct-write backend).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("{0}")]
    Unknown(String),
}

/// User-facing error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Local field validation failed; never reaches the network.
    Validation,
    /// Backend credentials missing or placeholder.
    Configuration,
    /// Offline before any call was attempted.
    Connectivity,
    /// Duplicate submission.
    Conflict,
    /// Timeout or network failure during the call; retryable.
    Transport,
    /// Anything else; retryable.
    Unknown,
}

impl RecruitError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a conflict error on `field`.
    pub fn conflict(field: Field, message: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            message: message.into(),
        }
    }

    /// Creates an uncategorized error with the given message.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Classifies this error into a user-facing category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Config { .. } => ErrorKind::Configuration,
            Self::Offline => ErrorKind::Connectivity,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Rejected { .. } | Self::Storage(_) | Self::Io(_) | Self::Unknown(_) => {
                ErrorKind::Unknown
            }
        }
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns true if this is a transport timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(t) if t.is_timeout())
    }

    /// Returns true if this is a transport-level network failure.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(t) if !t.is_timeout())
    }

    /// Returns true if the applicant can retry without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Connectivity | ErrorKind::Transport | ErrorKind::Unknown
        )
    }
}

/// Validation errors for an application record.
///
/// Carries one message per failing field, in field declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationError {
    errors: BTreeMap<Field, String>,
}

impl ValidationError {
    /// Creates a validation error from a field → message map.
    pub fn new(errors: BTreeMap<Field, String>) -> Self {
        Self { errors }
    }

    /// Creates a validation error for a single field.
    pub fn field(field: Field, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field, message.into());
        Self { errors }
    }

    /// Field → message for every failing field.
    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    /// Message for a single field, if it failed.
    pub fn message(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if no field failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the error, returning the field map.
    pub fn into_errors(self) -> BTreeMap<Field, String> {
        self.errors
    }
}

fn summarize(errors: &BTreeMap<Field, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Delivery channel a transport error occurred on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// JSON relay endpoint.
    Relay,
    /// PostgREST / direct-write HTTP API.
    Database,
    /// Forms relay primary channel (URL-encoded frame post).
    FramePost,
    /// Forms relay secondary channel (opaque multipart post).
    OpaquePost,
    /// Connectivity probe.
    Probe,
}

impl Channel {
    /// Short name for logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Relay => "relay",
            Channel::Database => "database",
            Channel::FramePost => "frame-post",
            Channel::OpaquePost => "opaque-post",
            Channel::Probe => "probe",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The call did not complete within its window.
    #[error("{channel} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// Channel that timed out.
        channel: Channel,
        /// Window that elapsed.
        after: Duration,
    },

    /// Connection, DNS, TLS, or body-transfer failure.
    #[error("{channel} network failure: {message}")]
    Network {
        /// Channel that failed.
        channel: Channel,
        /// Underlying error text.
        message: String,
    },
}

impl TransportError {
    /// Creates a timeout error.
    pub fn timeout(channel: Channel, after: Duration) -> Self {
        Self::Timeout { channel, after }
    }

    /// Creates a network error with the given message.
    pub fn network(channel: Channel, message: impl Into<String>) -> Self {
        Self::Network {
            channel,
            message: message.into(),
        }
    }

    /// Classifies a reqwest error. `window` is reported for timeouts.
    pub fn from_reqwest(channel: Channel, err: &reqwest::Error, window: Duration) -> Self {
        if err.is_timeout() {
            Self::timeout(channel, window)
        } else {
            Self::network(channel, err.to_string())
        }
    }

    /// Returns true for timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Channel the error occurred on.
    pub fn channel(&self) -> Channel {
        match self {
            Self::Timeout { channel, .. } | Self::Network { channel, .. } => *channel,
        }
    }
}

/// Storage-related errors for the embedded store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database file or data is corrupted.
    #[error("Database corrupted: {0}")]
    Corrupted(String),

    /// Database is locked by another process.
    #[error("Database is locked by another writer")]
    DatabaseLocked,

    /// Transaction failed (commit, rollback, etc.).
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from the redb storage engine.
    #[error("Storage engine error: {0}")]
    Redb(String),

    /// Database schema version doesn't match expected version.
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Expected schema version.
        expected: u32,
        /// Actual schema version found in database.
        found: u32,
    },

    /// Blocking storage task failed to complete.
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }
}

// Conversions from redb error types
impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::Redb(err.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Transaction(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Transaction(format!("Commit failed: {}", err))
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::Redb(format!("Table error: {}", err))
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::Redb(format!("Storage error: {}", err))
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Task(err.to_string())
    }
}

// Also allow direct conversion to RecruitError for convenience
impl From<redb::TransactionError> for RecruitError {
    fn from(err: redb::TransactionError) -> Self {
        RecruitError::Storage(StorageError::from(err))
    }
}

impl From<redb::CommitError> for RecruitError {
    fn from(err: redb::CommitError) -> Self {
        RecruitError::Storage(StorageError::from(err))
    }
}

impl From<redb::TableError> for RecruitError {
    fn from(err: redb::TableError) -> Self {
        RecruitError::Storage(StorageError::from(err))
    }
}

impl From<redb::StorageError> for RecruitError {
    fn from(err: redb::StorageError) -> Self {
        RecruitError::Storage(StorageError::from(err))
    }
}

impl From<bincode::Error> for RecruitError {
    fn from(err: bincode::Error) -> Self {
        RecruitError::Storage(StorageError::from(err))
    }
}
