//! # recruit
//!
//! Intake for a student chapter's recruitment form: field validation, a
//! submit state machine, and three interchangeable submission backends.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recruit::{Config, Field, FormController, SubmitOutcome};
//!
//! let controller = FormController::from_config(&Config::from_env()?)?;
//!
//! controller.set_field(Field::Name, "Jo Lee");
//! controller.set_field(Field::Email, "jo@example.com");
//! // ...remaining fields
//!
//! match controller.submit().await {
//!     SubmitOutcome::Submitted { ack, notice } => println!("{}: {}", notice.title, ack),
//!     SubmitOutcome::Failed { notice, .. } => eprintln!("{}", notice.description),
//!     SubmitOutcome::Ignored => {}
//! }
//! ```
//!
//! ## Key Concepts
//!
//! ### Application record
//!
//! Eight string fields: name, email, university, year, position, skills,
//! experience (optional), and motivation. University, year, and position
//! are constrained to a [`Catalog`].
//!
//! ### Backends
//!
//! - **Direct-write** ([`submission::DirectWriteBackend`]): inserts into an
//!   [`storage::ApplicationStore`] (embedded redb file or a PostgREST
//!   database) and supports a pre-submit duplicate check on email.
//! - **Relay** ([`submission::RelayBackend`]): JSON POST to a form relay.
//! - **Forms relay** ([`submission::FormsRelayBackend`]): posts to a hosted
//!   form through a two-channel fallback chain and can only report
//!   best-effort delivery (see [`Ack`]).
//!
//! ## Features
//!
//! - `cli` (default) - the `recruit` operator binary
//!
//! ## Thread Safety
//!
//! [`FormController`] is `Send + Sync`; share it with `Arc`. Its submitting
//! flag makes overlapping `submit()` calls no-ops rather than duplicates.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod controller;
mod error;
mod types;

pub mod application;
pub mod export;
pub mod network;
pub mod storage;
pub mod submission;

// ============================================================================
// Public API re-exports
// ============================================================================

// Form orchestration
pub use controller::{FormController, Notice, NoticeLevel, SubmitOutcome};

// Configuration
pub use config::{
    is_placeholder, BackendConfig, Config, Timeouts, DEFAULT_FORM_URL, PLACEHOLDER_MARKERS,
    RELAY_ENDPOINT_PREFIX,
};

// Error handling
pub use error::{
    Channel, ErrorKind, RecruitError, Result, StorageError, TransportError, ValidationError,
};

// Core types
pub use types::{ApplicationId, Timestamp};

// Domain types
pub use application::{
    mask_email, validate, Application, ApplicationRecord, Catalog, CatalogEntry, Field,
    ValidationResult,
};

// Submission
pub use submission::{create_backend, Ack, CompletionSignal, DuplicateCheck, SubmissionBackend};

// Storage (for operator tooling)
pub use storage::{open_store, ApplicationFilter, ApplicationStore, SortKey};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common recruit usage.
///
/// ```rust
/// use recruit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::application::{validate, ApplicationRecord, Catalog, Field};
    pub use crate::config::Config;
    pub use crate::controller::{FormController, Notice, SubmitOutcome};
    pub use crate::error::{RecruitError, Result};
    pub use crate::submission::{Ack, SubmissionBackend};
}
