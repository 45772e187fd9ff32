//! Configuration types for recruit.
//!
//! The [`Config`] struct selects the active submission backend and carries
//! the field catalog and channel timeouts:
//! - Backend: embedded store, PostgREST database, JSON relay, or forms relay
//! - Catalog: allowed universities, years, and positions
//! - Timeouts: channel windows for the forms relay, request timeout for the rest
//!
//! # Example
//! ```rust
//! use recruit::{BackendConfig, Config};
//!
//! // Defaults: forms relay to the deployed form, default catalog
//! let config = Config::default();
//!
//! // Relay to a form endpoint
//! let config = Config {
//!     backend: BackendConfig::Relay {
//!         endpoint: Some("https://usebasin.com/f/abc123".into()),
//!     },
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::Catalog;
use crate::error::{RecruitError, Result};

/// Production form response endpoint for the forms relay backend.
pub const DEFAULT_FORM_URL: &str =
    "https://docs.google.com/forms/d/e/1FAIpQLSc9EpdJDJSCZeagdlul66N7CFjly0j635StP1IW2sccSzQi3A/formResponse";

/// Required prefix for relay endpoints.
pub const RELAY_ENDPOINT_PREFIX: &str = "https://usebasin.com/f/";

/// Substrings that mark a configuration value as an unfilled template.
pub const PLACEHOLDER_MARKERS: &[&str] = &[
    "YOUR_FORM_ID",
    "your_basin_endpoint_here",
    "your-project-ref",
    "your-anon-key",
];

/// Application intake configuration.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use std::time::Duration;
/// use recruit::{Config, Timeouts};
///
/// let config = Config {
///     timeouts: Timeouts {
///         frame_window: Duration::from_secs(8),
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Which backend receives submissions.
    pub backend: BackendConfig,

    /// Allowed values for the catalog-constrained fields.
    pub catalog: Catalog,

    /// Channel and request timeouts.
    pub timeouts: Timeouts,

    /// Link shown to the applicant after a successful submission
    /// (e.g. a community group invite).
    pub follow_up_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            catalog: Catalog::default(),
            timeouts: Timeouts::default(),
            follow_up_url: None,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Config for the embedded direct-write store at `path`.
    pub fn with_embedded_store(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::Embedded { path: path.into() },
            ..Default::default()
        }
    }

    /// Loads configuration from `RECRUIT_*` environment variables.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `RECRUIT_BACKEND` | `embedded`, `database`, `relay`, or `forms` (default) |
    /// | `RECRUIT_DB_PATH` | Embedded store file (default `applications.db`) |
    /// | `RECRUIT_DATABASE_URL` / `RECRUIT_DATABASE_KEY` | PostgREST project URL and API key |
    /// | `RECRUIT_RELAY_ENDPOINT` | Relay endpoint |
    /// | `RECRUIT_FORM_URL` | Form response endpoint |
    /// | `RECRUIT_FOLLOW_UP_URL` | Post-submission link |
    ///
    /// Missing credentials are not an error here; the backend reports them
    /// as a configuration error when a submission is attempted.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `RECRUIT_BACKEND` names an unknown backend.
    pub fn from_env() -> Result<Self> {
        let backend = match var("RECRUIT_BACKEND").as_deref() {
            None | Some("forms") => BackendConfig::Forms {
                form_url: var("RECRUIT_FORM_URL").unwrap_or_else(|| DEFAULT_FORM_URL.into()),
                probe_urls: default_probe_urls(),
            },
            Some("embedded") => BackendConfig::Embedded {
                path: var("RECRUIT_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("applications.db")),
            },
            Some("database") => BackendConfig::Database {
                url: var("RECRUIT_DATABASE_URL"),
                api_key: var("RECRUIT_DATABASE_KEY"),
            },
            Some("relay") => BackendConfig::Relay {
                endpoint: var("RECRUIT_RELAY_ENDPOINT"),
            },
            Some(other) => {
                return Err(RecruitError::config(format!(
                    "unknown RECRUIT_BACKEND '{}' (expected embedded, database, relay, or forms)",
                    other
                )))
            }
        };

        debug!(backend = backend.name(), "Loaded configuration from environment");

        Ok(Self {
            backend,
            follow_up_url: var("RECRUIT_FOLLOW_UP_URL"),
            ..Default::default()
        })
    }

    /// Validates the configuration.
    ///
    /// Checks internal consistency only. Backend credentials are checked by
    /// the backend itself (see
    /// [`SubmissionBackend::validate_configuration`](crate::submission::SubmissionBackend::validate_configuration)).
    ///
    /// # Errors
    /// Returns a configuration error if:
    /// - any catalog list is empty
    /// - any timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.catalog.has_empty_list() {
            return Err(RecruitError::config(
                "catalog lists (universities, years, positions) must not be empty",
            ));
        }

        let t = &self.timeouts;
        for (name, value) in [
            ("frame_window", t.frame_window),
            ("opaque_window", t.opaque_window),
            ("probe_timeout", t.probe_timeout),
            ("request_timeout", t.request_timeout),
        ] {
            if value.is_zero() {
                return Err(RecruitError::config(format!(
                    "timeouts.{} must be greater than 0",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Submission backend selection.
#[derive(Clone, Debug)]
pub enum BackendConfig {
    /// Local embedded store (redb file). Direct-write with duplicate check.
    Embedded {
        /// Path to the store file (created if missing).
        path: PathBuf,
    },

    /// Hosted relational database behind a PostgREST API. Direct-write with
    /// duplicate check.
    Database {
        /// Project URL (e.g. `https://xyz.supabase.co`).
        url: Option<String>,
        /// Public API key.
        api_key: Option<String>,
    },

    /// Third-party JSON form relay.
    Relay {
        /// Endpoint URL (`https://usebasin.com/f/<id>`).
        endpoint: Option<String>,
    },

    /// Hosted form via URL-encoded POST with best-effort acknowledgement.
    Forms {
        /// Form response endpoint.
        form_url: String,
        /// URLs probed with HEAD before delivery. Empty disables the probe.
        probe_urls: Vec<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Forms {
            form_url: DEFAULT_FORM_URL.into(),
            probe_urls: default_probe_urls(),
        }
    }
}

impl BackendConfig {
    /// Short backend name for logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Embedded { .. } => "embedded",
            Self::Database { .. } => "database",
            Self::Relay { .. } => "relay",
            Self::Forms { .. } => "forms",
        }
    }

    /// Returns true for backends that store rows directly and support the
    /// duplicate check.
    pub fn is_direct_write(&self) -> bool {
        matches!(self, Self::Embedded { .. } | Self::Database { .. })
    }
}

/// Timeouts for submission channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Forms relay primary channel: after this window the attempt is
    /// declared complete even without a response.
    /// Default: 10 s
    pub frame_window: Duration,

    /// Forms relay secondary channel: the request is aborted (and fails)
    /// after this window.
    /// Default: 8 s
    pub opaque_window: Duration,

    /// Pause after an opaque post before reporting completion.
    /// Default: 1 s
    pub settle_delay: Duration,

    /// Connectivity probe timeout.
    /// Default: 5 s
    pub probe_timeout: Duration,

    /// Relay and database request timeout.
    /// Default: 30 s
    pub request_timeout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            frame_window: Duration::from_secs(10),
            opaque_window: Duration::from_secs(8),
            settle_delay: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Returns true if `value` is empty or still contains a template marker.
pub fn is_placeholder(value: &str) -> bool {
    value.trim().is_empty() || PLACEHOLDER_MARKERS.iter().any(|m| value.contains(m))
}

/// Derives the default probe URLs: a well-known host and the form's view page.
fn default_probe_urls() -> Vec<String> {
    vec![
        "https://www.google.com/favicon.ico".into(),
        DEFAULT_FORM_URL.replace("/formResponse", "/viewform"),
    ]
}

fn var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => {
            warn!("{key} is set but empty");
            None
        }
        Err(_) => None,
    }
}
