//! Form controller: the submit state machine.
//!
//! ```text
//! Editing ──submit──► Validating ──invalid──► Editing (field errors)
//!                         │
//!                       valid
//!                         ▼
//!              CheckingConnectivity ──offline──► Editing (notice)
//!                         │
//!                CheckingConfiguration ──bad──► Editing (notice)
//!                         │
//!                CheckingDuplicate? ──exists──► Editing (email error)
//!                         │
//!                    Submitting ──ok──► Editing (record reset)
//!                         └──────err──► Editing (record kept, notice)
//! ```
//!
//! A submitting flag gates re-entry: a second `submit()` while one is in
//! flight returns [`SubmitOutcome::Ignored`] without touching the network.
//! The flag is cleared on every exit path.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, instrument, warn};

use crate::application::{validate, ApplicationRecord, Catalog, Field};
use crate::config::Config;
use crate::error::{ErrorKind, RecruitError, Result};
use crate::network::{AlwaysOnline, NetworkStatus};
use crate::storage::DUPLICATE_EMAIL_MESSAGE;
use crate::submission::{create_backend, Ack, SubmissionBackend};

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    /// The application went through.
    Success,
    /// The application did not go through.
    Error,
}

/// Transient message for the applicant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Short headline.
    pub title: String,
    /// One or two sentences of detail.
    pub description: String,
    /// Optional follow-up link.
    pub link: Option<String>,
}

impl Notice {
    fn new(level: NoticeLevel, title: &str, description: &str) -> Self {
        Self {
            level,
            title: title.to_string(),
            description: description.to_string(),
            link: None,
        }
    }

    /// Notice shown after a successful submission.
    pub fn success(link: Option<String>) -> Self {
        Self {
            link,
            ..Self::new(
                NoticeLevel::Success,
                "Application Submitted Successfully!",
                "Thank you for applying! We'll review your application and get back to you soon.",
            )
        }
    }

    /// Notice describing a failed submission.
    pub fn for_error(err: &RecruitError) -> Self {
        let (title, description) = match err.kind() {
            ErrorKind::Validation => (
                "Please Fix Form Errors",
                "Please correct the highlighted fields before submitting.",
            ),
            ErrorKind::Connectivity => (
                "No Internet Connection",
                "Please check your internet connection and try again.",
            ),
            ErrorKind::Configuration => (
                "Configuration Error",
                "Form service is not properly configured. Please contact support.",
            ),
            ErrorKind::Conflict => (
                "Email Already Registered",
                "An application with this email already exists. Please use a different email address.",
            ),
            ErrorKind::Transport if err.is_timeout() => (
                "Request Timeout",
                "The submission is taking too long. Please check your connection and try again.",
            ),
            ErrorKind::Transport => (
                "Network Error",
                "Unable to connect to the server. Please check your internet connection.",
            ),
            ErrorKind::Unknown => (
                "Submission Error",
                "There was an issue submitting your application. Please try again.",
            ),
        };
        Self::new(NoticeLevel::Error, title, description)
    }
}

/// Result of one [`FormController::submit`] call.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing happened.
    Ignored,
    /// Delivered. The record and errors have been reset.
    Submitted {
        /// How delivery was acknowledged.
        ack: Ack,
        /// Message for the applicant.
        notice: Notice,
    },
    /// Not delivered. The record is kept for another attempt.
    Failed {
        /// Why.
        error: RecruitError,
        /// Message for the applicant.
        notice: Notice,
    },
}

impl SubmitOutcome {
    /// Returns true for [`SubmitOutcome::Submitted`].
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted { .. })
    }

    /// The notice to show, if any.
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            SubmitOutcome::Ignored => None,
            SubmitOutcome::Submitted { notice, .. } | SubmitOutcome::Failed { notice, .. } => {
                Some(notice)
            }
        }
    }
}

#[derive(Debug, Default)]
struct FormState {
    record: ApplicationRecord,
    errors: BTreeMap<Field, String>,
}

/// Clears the submitting flag when dropped.
struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the applicant's working record and drives submission.
pub struct FormController {
    backend: Arc<dyn SubmissionBackend>,
    network: Arc<dyn NetworkStatus>,
    catalog: Catalog,
    follow_up_url: Option<String>,
    state: Mutex<FormState>,
    submitting: AtomicBool,
}

impl FormController {
    /// Creates a controller over `backend` with the default catalog,
    /// always-online connectivity, and no follow-up link.
    pub fn new(backend: Arc<dyn SubmissionBackend>) -> Self {
        Self {
            backend,
            network: Arc::new(AlwaysOnline),
            catalog: Catalog::default(),
            follow_up_url: None,
            state: Mutex::new(FormState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    /// Builds the configured backend and a controller around it.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from [`Config::validate`] and errors
    /// from [`create_backend`].
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let backend = create_backend(config)?;
        Ok(Self::new(backend)
            .with_catalog(config.catalog.clone())
            .with_follow_up_url(config.follow_up_url.clone()))
    }

    /// Uses `network` for the connectivity check.
    pub fn with_network(mut self, network: Arc<dyn NetworkStatus>) -> Self {
        self.network = network;
        self
    }

    /// Validates against `catalog`.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Attaches `url` to the success notice.
    pub fn with_follow_up_url(mut self, url: Option<String>) -> Self {
        self.follow_up_url = url;
        self
    }

    /// The active backend.
    pub fn backend(&self) -> &Arc<dyn SubmissionBackend> {
        &self.backend
    }

    /// The catalog records are validated against.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Updates one field and clears that field's error.
    pub fn set_field(&self, field: Field, value: impl Into<String>) {
        let mut state = self.lock();
        state.record.set(field, value);
        state.errors.remove(&field);
    }

    /// Replaces the whole record and clears all errors.
    pub fn load(&self, record: ApplicationRecord) {
        let mut state = self.lock();
        state.record = record;
        state.errors.clear();
    }

    /// Snapshot of the working record.
    pub fn record(&self) -> ApplicationRecord {
        self.lock().record.clone()
    }

    /// Snapshot of the current field errors.
    pub fn errors(&self) -> BTreeMap<Field, String> {
        self.lock().errors.clone()
    }

    /// Current error for one field.
    pub fn field_error(&self, field: Field) -> Option<String> {
        self.lock().errors.get(&field).cloned()
    }

    /// Returns true while a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Clears the record and all errors.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.record.clear();
        state.errors.clear();
    }

    /// Runs the submit flow once.
    ///
    /// Never retries. On success the record is reset, unless it was edited
    /// while the submission was in flight; those edits are kept. On failure
    /// the record is kept and field errors (validation or email conflict)
    /// are recorded.
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn submit(&self) -> SubmitOutcome {
        if self.submitting.swap(true, Ordering::SeqCst) {
            debug!("Submit ignored, submission already in flight");
            return SubmitOutcome::Ignored;
        }
        let _guard = SubmittingGuard(&self.submitting);

        let record = {
            let mut state = self.lock();
            state.errors.clear();
            state.record.clone()
        };

        match self.deliver(&record).await {
            Ok(ack) => {
                info!(email = %record.masked_email(), %ack, "Application submitted");
                {
                    let mut state = self.lock();
                    if state.record == record {
                        state.record.clear();
                    } else {
                        debug!("Record edited during submission, keeping edits");
                    }
                    state.errors.clear();
                }
                SubmitOutcome::Submitted {
                    ack,
                    notice: Notice::success(self.follow_up_url.clone()),
                }
            }
            Err(error) => {
                {
                    let mut state = self.lock();
                    match &error {
                        RecruitError::Validation(v) => state.errors = v.errors().clone(),
                        RecruitError::Conflict { field, message } => {
                            state.errors.insert(*field, message.clone());
                        }
                        _ => {}
                    }
                }
                let notice = Notice::for_error(&error);
                SubmitOutcome::Failed { error, notice }
            }
        }
    }

    async fn deliver(&self, record: &ApplicationRecord) -> Result<Ack> {
        let result = validate(record, &self.catalog);
        if !result.is_valid() {
            debug!(failed = result.errors().len(), "Validation failed");
        }
        result.into_result()?;

        if !self.network.is_online() {
            warn!("Submit attempted while offline");
            return Err(RecruitError::Offline);
        }

        if let Err(e) = self.backend.validate_configuration() {
            error!(error = %e, "Submission backend is not configured");
            return Err(e);
        }

        if let Some(check) = self.backend.duplicate_check() {
            if check.email_exists(&record.email).await {
                info!(email = %record.masked_email(), "Duplicate application rejected");
                return Err(RecruitError::conflict(Field::Email, DUPLICATE_EMAIL_MESSAGE));
            }
        }

        self.backend.submit(record).await.inspect_err(|e| {
            warn!(error = %e, kind = ?e.kind(), "Submission failed");
        })
    }
}
