//! Direct-write backend: one insert against an [`ApplicationStore`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{Ack, DuplicateCheck, SubmissionBackend};
use crate::application::{mask_email, ApplicationRecord};
use crate::error::Result;
use crate::storage::ApplicationStore;

/// Writes each submission as a row in an [`ApplicationStore`].
///
/// Any failure is terminal: transport errors, constraint violations, and
/// rejections all propagate with their category intact, and no retry is
/// attempted.
#[derive(Clone)]
pub struct DirectWriteBackend {
    store: Arc<dyn ApplicationStore>,
}

impl DirectWriteBackend {
    /// Wraps a store.
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn ApplicationStore> {
        &self.store
    }
}

#[async_trait]
impl DuplicateCheck for DirectWriteBackend {
    async fn email_exists(&self, email: &str) -> bool {
        match self.store.find_by_email(email).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!(
                    email = %mask_email(email),
                    error = %e,
                    "Duplicate check failed, continuing with submission"
                );
                false
            }
        }
    }
}

#[async_trait]
impl SubmissionBackend for DirectWriteBackend {
    fn name(&self) -> &'static str {
        "direct-write"
    }

    fn validate_configuration(&self) -> Result<()> {
        self.store.check_configuration()
    }

    fn duplicate_check(&self) -> Option<&dyn DuplicateCheck> {
        Some(self)
    }

    #[instrument(skip_all, fields(store = self.store.name(), email = %record.masked_email()))]
    async fn submit(&self, record: &ApplicationRecord) -> Result<Ack> {
        let application = self.store.insert(record).await?;
        info!(id = %application.id, "Application written");
        Ok(Ack::Confirmed {
            reference: Some(application.id.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{Application, Field};
    use crate::error::{Channel, RecruitError, TransportError};
    use crate::storage::{ApplicationFilter, RedbStore};
    use crate::types::ApplicationId;
    use tempfile::tempdir;

    struct FailingStore;

    #[async_trait]
    impl ApplicationStore for FailingStore {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn check_configuration(&self) -> Result<()> {
            Ok(())
        }
        async fn insert(&self, _record: &ApplicationRecord) -> Result<Application> {
            Err(TransportError::network(Channel::Database, "connection refused").into())
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<ApplicationId>> {
            Err(RecruitError::unknown("lookup exploded"))
        }
        async fn list(&self, _filter: &ApplicationFilter) -> Result<Vec<Application>> {
            Ok(Vec::new())
        }
    }

    fn record() -> ApplicationRecord {
        ApplicationRecord::new()
            .with(Field::Name, "Jo Lee")
            .with(Field::Email, "jo@x.com")
    }

    #[tokio::test]
    async fn test_submit_returns_confirmed_with_id() {
        let dir = tempdir().unwrap();
        let store = Arc::new(RedbStore::open(dir.path().join("a.db")).unwrap());
        let backend = DirectWriteBackend::new(store.clone());

        let ack = backend.submit(&record()).await.unwrap();
        let stored = store.find_by_email("jo@x.com").await.unwrap().unwrap();
        assert_eq!(
            ack,
            Ack::Confirmed {
                reference: Some(stored.to_string())
            }
        );
        assert!(backend.email_exists("jo@x.com").await);
    }

    #[tokio::test]
    async fn test_duplicate_submit_is_conflict() {
        let dir = tempdir().unwrap();
        let store = Arc::new(RedbStore::open(dir.path().join("a.db")).unwrap());
        let backend = DirectWriteBackend::new(store);

        backend.submit(&record()).await.unwrap();
        let err = backend.submit(&record()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_duplicate_check_fails_open() {
        let backend = DirectWriteBackend::new(Arc::new(FailingStore));
        assert!(!backend.email_exists("jo@x.com").await);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let backend = DirectWriteBackend::new(Arc::new(FailingStore));
        let err = backend.submit(&record()).await.unwrap_err();
        assert!(err.is_network());
    }
}
