//! Submission backends.
//!
//! A [`SubmissionBackend`] delivers a validated [`ApplicationRecord`] to a
//! persistence target. Exactly one backend is active per deployment:
//!
//! | Backend | Delivery | Acknowledgement | Duplicate check |
//! |---------|----------|-----------------|-----------------|
//! | [`DirectWriteBackend`] | Insert into an [`ApplicationStore`] | Confirmed | Yes |
//! | [`RelayBackend`] | JSON POST to a form relay | Confirmed | No |
//! | [`FormsRelayBackend`] | URL-encoded POST, multipart fallback | Best-effort | No |
//!
//! A best-effort acknowledgement means the transport did not fail within
//! its window; it does not prove the destination recorded anything.
//! [`Ack`] keeps the two apart so callers can tell them apart too.

pub mod direct;
pub mod fields;
pub mod forms;
pub mod relay;

pub use direct::DirectWriteBackend;
pub use fields::{FieldMap, FORM_FIELD_MAP, RELAY_FIELD_MAP};
pub use forms::{lint, FormsRelayBackend, LintWarning};
pub use relay::RelayBackend;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::application::ApplicationRecord;
use crate::config::{BackendConfig, Config};
use crate::error::{Channel, Result};
use crate::storage::{open_store, ApplicationStore};

/// How a backend knows the submission went through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ack {
    /// The destination answered and accepted the record.
    Confirmed {
        /// Backend reference for the stored record, when one is returned.
        reference: Option<String>,
    },
    /// No transport error occurred, but delivery was not observed.
    BestEffort {
        /// Channel that completed.
        channel: Channel,
        /// What completion was inferred from.
        signal: CompletionSignal,
    },
}

impl Ack {
    /// Returns true for [`Ack::Confirmed`].
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Ack::Confirmed { .. })
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ack::Confirmed {
                reference: Some(reference),
            } => write!(f, "confirmed ({})", reference),
            Ack::Confirmed { reference: None } => f.write_str("confirmed"),
            Ack::BestEffort { channel, signal } => {
                write!(f, "best-effort via {} ({})", channel, signal)
            }
        }
    }
}

/// Evidence behind a best-effort acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionSignal {
    /// A response arrived; its content was not inspected.
    Loaded,
    /// The completion window elapsed with no response and no error.
    WindowElapsed,
    /// The request was sent without a transport error.
    NoTransportError,
}

impl fmt::Display for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompletionSignal::Loaded => "response loaded",
            CompletionSignal::WindowElapsed => "window elapsed",
            CompletionSignal::NoTransportError => "no transport error",
        })
    }
}

/// Pre-submission lookup of an email among stored applications.
#[async_trait]
pub trait DuplicateCheck: Send + Sync {
    /// Returns true if an application with `email` is already stored.
    ///
    /// Lookup failures return false: the write itself still enforces
    /// uniqueness.
    async fn email_exists(&self, email: &str) -> bool;
}

/// A submission strategy.
#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Verifies the backend has usable credentials and endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`RecruitError::Config`](crate::RecruitError::Config) when a
    /// value is missing or still a template placeholder.
    fn validate_configuration(&self) -> Result<()>;

    /// Returns true if [`validate_configuration`](Self::validate_configuration) passes.
    fn is_configured(&self) -> bool {
        self.validate_configuration().is_ok()
    }

    /// Duplicate check collaborator, for backends that have one.
    fn duplicate_check(&self) -> Option<&dyn DuplicateCheck> {
        None
    }

    /// Delivers a record. One call is one delivery attempt; backends never
    /// retry on their own beyond their documented fallback chain.
    async fn submit(&self, record: &ApplicationRecord) -> Result<Ack>;
}

/// Builds the backend selected by `config.backend`.
///
/// # Errors
///
/// Returns storage errors from opening an embedded store, or a transport
/// error if an HTTP client cannot be built. Missing credentials are not
/// reported here.
pub fn create_backend(config: &Config) -> Result<Arc<dyn SubmissionBackend>> {
    let backend: Arc<dyn SubmissionBackend> = match &config.backend {
        BackendConfig::Embedded { .. } | BackendConfig::Database { .. } => {
            let store: Arc<dyn ApplicationStore> = open_store(&config.backend, &config.timeouts)?;
            Arc::new(DirectWriteBackend::new(store))
        }
        BackendConfig::Relay { endpoint } => Arc::new(RelayBackend::new(
            endpoint.clone(),
            config.timeouts.request_timeout,
        )?),
        BackendConfig::Forms {
            form_url,
            probe_urls,
        } => Arc::new(
            FormsRelayBackend::new(form_url.clone(), config.timeouts)?
                .with_probe_urls(probe_urls.clone()),
        ),
    };

    info!(backend = backend.name(), "Submission backend ready");
    Ok(backend)
}
