//! Hosted-form relay backend with a two-channel fallback chain.
//!
//! The hosted form accepts POSTs but gives no usable answer, so delivery is
//! inferred rather than observed:
//!
//! ```text
//! lint (warn only)
//!   └─ probe (HEAD; only a timeout aborts)
//!        └─ frame post (URL-encoded, trimmed)
//!             ├─ response within window ──────► BestEffort { FramePost, Loaded }
//!             ├─ window elapses ──────────────► BestEffort { FramePost, WindowElapsed }
//!             └─ transport error / missing field
//!                  └─ opaque post (multipart, untrimmed)
//!                       ├─ sent within window ─► settle ─► BestEffort { OpaquePost, NoTransportError }
//!                       └─ timeout / error ────► Err(opaque error)
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::multipart;
use reqwest::Client;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

use super::fields::{FieldMap, FORM_FIELD_MAP};
use super::{Ack, CompletionSignal, SubmissionBackend};
use crate::application::{ApplicationRecord, Field};
use crate::config::{is_placeholder, Timeouts};
use crate::error::{Channel, RecruitError, Result, TransportError, ValidationError};

/// Values longer than this (in characters) trigger a lint warning.
pub const MAX_VALUE_LENGTH: usize = 5000;

/// Fields the frame channel refuses to send without.
const FRAME_REQUIRED_FIELDS: [Field; 6] = [
    Field::Name,
    Field::Email,
    Field::University,
    Field::Year,
    Field::Position,
    Field::Motivation,
];

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag pattern compiles"));

/// Data-quality concern found before delivery. Never blocks submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LintWarning {
    /// Value exceeds [`MAX_VALUE_LENGTH`].
    TooLong {
        /// Offending field.
        field: Field,
        /// Length in characters.
        length: usize,
    },
    /// Value contains emoji the form may mangle.
    Emoji {
        /// Offending field.
        field: Field,
    },
    /// Value contains markup the form may strip.
    Html {
        /// Offending field.
        field: Field,
    },
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintWarning::TooLong { field, length } => {
                write!(f, "field '{}' is very long ({} characters)", field, length)
            }
            LintWarning::Emoji { field } => write!(f, "field '{}' contains emoji", field),
            LintWarning::Html { field } => write!(f, "field '{}' contains HTML tags", field),
        }
    }
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F | 0x1F300..=0x1F5FF | 0x1F680..=0x1F6FF | 0x1F1E0..=0x1F1FF
    )
}

/// Checks every field for values the hosted form handles poorly.
pub fn lint(record: &ApplicationRecord) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    for field in Field::ALL {
        let value = record.get(field);
        let length = value.chars().count();
        if length > MAX_VALUE_LENGTH {
            warnings.push(LintWarning::TooLong { field, length });
        }
        if value.chars().any(is_emoji) {
            warnings.push(LintWarning::Emoji { field });
        }
        if HTML_TAG.is_match(value) {
            warnings.push(LintWarning::Html { field });
        }
    }
    warnings
}

/// Delivers to a hosted form with best-effort acknowledgement.
#[derive(Clone, Debug)]
pub struct FormsRelayBackend {
    client: Client,
    form_url: String,
    field_map: FieldMap,
    probe_urls: Vec<String>,
    timeouts: Timeouts,
}

impl FormsRelayBackend {
    /// Creates a backend posting to `form_url` with the deployed form's
    /// entry ids and no connectivity probe.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(form_url: impl Into<String>, timeouts: Timeouts) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::network(Channel::FramePost, e.to_string()))?;
        Ok(Self {
            client,
            form_url: form_url.into(),
            field_map: FORM_FIELD_MAP,
            probe_urls: Vec::new(),
            timeouts,
        })
    }

    /// Probes these URLs with HEAD before each delivery.
    pub fn with_probe_urls(mut self, urls: Vec<String>) -> Self {
        self.probe_urls = urls;
        self
    }

    /// Uses a different field → entry id table.
    pub fn with_field_map(mut self, field_map: FieldMap) -> Self {
        self.field_map = field_map;
        self
    }

    /// Form response endpoint.
    pub fn form_url(&self) -> &str {
        &self.form_url
    }

    /// Field → entry id table in use.
    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    /// Checks reachability before delivery.
    ///
    /// Stops at the first failing URL. Only a timeout is an error; other
    /// failures are logged and delivery proceeds.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> Result<()> {
        let window = self.timeouts.probe_timeout;
        for url in &self.probe_urls {
            match timeout(window, self.client.head(url).send()).await {
                Ok(Ok(response)) => {
                    debug!(%url, status = response.status().as_u16(), "Probe ok");
                }
                Ok(Err(e)) if !e.is_timeout() => {
                    warn!(%url, error = %e, "Connectivity probe failed, continuing");
                    return Ok(());
                }
                Ok(Err(_)) | Err(_) => {
                    warn!(%url, "Connectivity probe timed out");
                    return Err(TransportError::timeout(Channel::Probe, window).into());
                }
            }
        }
        Ok(())
    }

    /// Primary channel: URL-encoded POST, trimmed values.
    ///
    /// A response of any status counts as loaded; an elapsed window counts
    /// as complete.
    pub async fn post_frame(&self, record: &ApplicationRecord) -> Result<Ack> {
        let missing: BTreeMap<Field, String> = FRAME_REQUIRED_FIELDS
            .iter()
            .filter(|f| record.get(**f).trim().is_empty())
            .map(|f| (*f, "Missing required field".to_string()))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::new(missing).into());
        }

        let window = self.timeouts.frame_window;
        let pairs = self.field_map.encode(record, true);
        let request = self.client.post(&self.form_url).form(&pairs).send();

        let signal = match timeout(window, request).await {
            Ok(Ok(response)) => {
                debug!(status = response.status().as_u16(), "Frame post loaded");
                CompletionSignal::Loaded
            }
            Ok(Err(e)) => return Err(TransportError::from_reqwest(Channel::FramePost, &e, window).into()),
            Err(_) => {
                debug!(window_ms = window.as_millis() as u64, "Frame post window elapsed");
                CompletionSignal::WindowElapsed
            }
        };

        Ok(Ack::BestEffort {
            channel: Channel::FramePost,
            signal,
        })
    }

    /// Secondary channel: multipart POST, untrimmed values. Fails on
    /// timeout; otherwise waits the settle delay before reporting.
    pub async fn post_opaque(&self, record: &ApplicationRecord) -> Result<Ack> {
        let window = self.timeouts.opaque_window;
        let form = self
            .field_map
            .encode(record, false)
            .into_iter()
            .fold(multipart::Form::new(), |form, (key, value)| form.text(key, value));
        let request = self.client.post(&self.form_url).multipart(form).send();

        match timeout(window, request).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(TransportError::from_reqwest(Channel::OpaquePost, &e, window).into())
            }
            Err(_) => return Err(TransportError::timeout(Channel::OpaquePost, window).into()),
        }

        sleep(self.timeouts.settle_delay).await;
        Ok(Ack::BestEffort {
            channel: Channel::OpaquePost,
            signal: CompletionSignal::NoTransportError,
        })
    }
}

#[async_trait]
impl SubmissionBackend for FormsRelayBackend {
    fn name(&self) -> &'static str {
        "forms-relay"
    }

    fn validate_configuration(&self) -> Result<()> {
        if is_placeholder(&self.form_url) {
            return Err(RecruitError::config("form URL is not configured"));
        }
        if !(self.form_url.starts_with("https://") || self.form_url.starts_with("http://")) {
            return Err(RecruitError::config(format!(
                "form URL must be an http(s) URL, got '{}'",
                self.form_url
            )));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(email = %record.masked_email()))]
    async fn submit(&self, record: &ApplicationRecord) -> Result<Ack> {
        self.validate_configuration()?;

        for warning in lint(record) {
            warn!(%warning, "Submission lint");
        }

        self.probe().await?;

        let frame_err = match self.post_frame(record).await {
            Ok(ack) => {
                info!(%ack, "Forms relay delivered");
                return Ok(ack);
            }
            Err(e) => e,
        };
        warn!(error = %frame_err, "Frame post failed, falling back to opaque post");

        match self.post_opaque(record).await {
            Ok(ack) => {
                info!(%ack, "Forms relay delivered");
                Ok(ack)
            }
            Err(opaque_err) => {
                error!(
                    frame = %frame_err,
                    opaque = %opaque_err,
                    "Both forms relay channels failed"
                );
                Err(opaque_err)
            }
        }
    }
}
