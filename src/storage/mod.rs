//! Storage layer for direct-write backends.
//!
//! A direct-write backend inserts the application as a row in a store that
//! enforces one application per email. Two stores implement the seam:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  DirectWriteBackend                          │
//! │                         │                                    │
//! │                         ▼                                    │
//! │              ┌─────────────────────┐                         │
//! │              │  ApplicationStore   │  ← Trait                │
//! │              └─────────────────────┘                         │
//! │                    ▲         ▲                               │
//! │                    │         │                               │
//! │         ┌─────────┴─┐   ┌───┴─────────┐                      │
//! │         │ RedbStore │   │  RestStore  │                      │
//! │         └───────────┘   └─────────────┘                      │
//! │          (embedded)       (PostgREST)                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod redb;
pub mod rest;
pub mod schema;

pub use self::redb::RedbStore;
pub use rest::RestStore;
pub use schema::{DatabaseMetadata, SCHEMA_VERSION};

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::{Application, ApplicationRecord};
use crate::config::{BackendConfig, Timeouts};
use crate::error::{RecruitError, Result};
use crate::types::ApplicationId;

/// Message attached to the email field when the address is already stored.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email is already registered";

/// Store for submitted applications.
///
/// Implementations enforce uniqueness on email: inserting a record whose
/// email already exists fails with [`RecruitError::Conflict`] on
/// [`Field::Email`](crate::Field::Email).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store can be shared between
/// the controller and operator tooling.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Short store name for logs.
    fn name(&self) -> &'static str;

    /// Verifies credentials and endpoints are usable. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`RecruitError::Config`] when a credential is missing or still
    /// a template placeholder.
    fn check_configuration(&self) -> Result<()>;

    /// Inserts a record, returning the stored application.
    ///
    /// # Errors
    ///
    /// - [`RecruitError::Conflict`] if the email is already stored
    /// - [`RecruitError::Transport`] on timeout or network failure
    /// - [`RecruitError::Rejected`] / [`RecruitError::Storage`] otherwise
    async fn insert(&self, record: &ApplicationRecord) -> Result<Application>;

    /// Looks up the application stored for `email`, if any.
    async fn find_by_email(&self, email: &str) -> Result<Option<ApplicationId>>;

    /// Lists stored applications matching `filter`, in `filter.sort` order.
    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>>;
}

/// Sort order for [`ApplicationStore::list`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Most recent submission first.
    #[default]
    Newest,
    /// Applicant name, A→Z (case-insensitive).
    Name,
    /// Position, A→Z; newest first within a position.
    Position,
}

/// Listing filter for operator views and export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    /// Only applications for this exact position.
    pub position: Option<String>,
    /// Case-insensitive substring matched against name, email, and university.
    pub search: Option<String>,
    /// Result order.
    pub sort: SortKey,
}

impl ApplicationFilter {
    /// Returns true if `application` passes the position and search filters.
    pub fn matches(&self, application: &Application) -> bool {
        let record = &application.record;

        if let Some(position) = &self.position {
            if &record.position != position {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [&record.name, &record.email, &record.university]
                    .iter()
                    .any(|value| value.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }

    /// Sorts `applications` in place according to `self.sort`.
    pub fn sort(&self, applications: &mut [Application]) {
        match self.sort {
            SortKey::Newest => {
                applications.sort_by_key(|a| Reverse((a.created_at, a.id)));
            }
            SortKey::Name => {
                applications.sort_by_key(|a| a.record.name.to_lowercase());
            }
            SortKey::Position => applications.sort_by(|a, b| {
                a.record
                    .position
                    .cmp(&b.record.position)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }
    }
}

/// Opens the store behind a direct-write backend configuration.
///
/// # Errors
///
/// - [`RecruitError::Config`] if `backend` is not a direct-write backend
/// - Storage errors from opening the embedded store
pub fn open_store(backend: &BackendConfig, timeouts: &Timeouts) -> Result<Arc<dyn ApplicationStore>> {
    match backend {
        BackendConfig::Embedded { path } => Ok(Arc::new(RedbStore::open(path)?)),
        BackendConfig::Database { url, api_key } => Ok(Arc::new(RestStore::new(
            url.clone(),
            api_key.clone(),
            timeouts.request_timeout,
        )?)),
        other => Err(RecruitError::config(format!(
            "backend '{}' does not store applications",
            other.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Field;
    use crate::types::Timestamp;
    use tempfile::tempdir;

    fn app(name: &str, position: &str, created: i64) -> Application {
        let mut application = Application::new(
            ApplicationRecord::new()
                .with(Field::Name, name)
                .with(Field::Email, format!("{}@x.com", name.to_lowercase()))
                .with(Field::University, "VIT")
                .with(Field::Position, position),
        );
        application.created_at = Timestamp::from_millis(created);
        application.updated_at = application.created_at;
        application
    }

    #[test]
    fn test_filter_default_matches_everything() {
        let filter = ApplicationFilter::default();
        assert!(filter.matches(&app("Jo", "Design", 1)));
    }

    #[test]
    fn test_filter_position_exact() {
        let filter = ApplicationFilter {
            position: Some("Design".into()),
            ..Default::default()
        };
        assert!(filter.matches(&app("Jo", "Design", 1)));
        assert!(!filter.matches(&app("Jo", "Media Team", 1)));
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let filter = ApplicationFilter {
            search: Some("  JO ".into()),
            ..Default::default()
        };
        assert!(filter.matches(&app("Jo", "Design", 1)));
        assert!(!filter.matches(&app("Sam", "Design", 1)));

        let by_university = ApplicationFilter {
            search: Some("vit".into()),
            ..Default::default()
        };
        assert!(by_university.matches(&app("Sam", "Design", 1)));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut apps = vec![app("A", "Design", 1), app("B", "Design", 3), app("C", "Design", 2)];
        ApplicationFilter::default().sort(&mut apps);
        let names: Vec<_> = apps.iter().map(|a| a.record.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_sort_by_position_then_newest() {
        let mut apps = vec![
            app("A", "Media Team", 1),
            app("B", "Design", 1),
            app("C", "Design", 2),
        ];
        let filter = ApplicationFilter {
            sort: SortKey::Position,
            ..Default::default()
        };
        filter.sort(&mut apps);
        let names: Vec<_> = apps.iter().map(|a| a.record.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_open_store_embedded() {
        let dir = tempdir().unwrap();
        let backend = BackendConfig::Embedded {
            path: dir.path().join("apps.db"),
        };
        let store = open_store(&backend, &Timeouts::default()).unwrap();
        assert_eq!(store.name(), "embedded");
        assert!(store.check_configuration().is_ok());
    }

    #[test]
    fn test_open_store_rejects_relay_backends() {
        let backend = BackendConfig::Relay { endpoint: None };
        let err = open_store(&backend, &Timeouts::default()).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_stores_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RedbStore>();
        assert_send_sync::<RestStore>();
    }
}
