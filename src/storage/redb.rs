//! redb-backed embedded application store.
//!
//! Uses [redb](https://docs.rs/redb), a pure Rust embedded key-value store,
//! for single-host deployments that want direct-write semantics without a
//! hosted database.
//!
//! Uniqueness on email is enforced inside the insert's write transaction:
//! redb has a single writer, so the index check and the row insert cannot
//! interleave with another insert.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::redb::{Database, DatabaseError, ReadableTable};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::schema::{
    email_key, DatabaseMetadata, APPLICATIONS_TABLE, EMAIL_INDEX_TABLE, METADATA_TABLE,
    SCHEMA_VERSION,
};
use super::{ApplicationFilter, ApplicationStore, DUPLICATE_EMAIL_MESSAGE};
use crate::application::{mask_email, Application, ApplicationRecord, Field};
use crate::error::{RecruitError, Result, StorageError};
use crate::types::ApplicationId;

/// Metadata key in the metadata table.
const METADATA_KEY: &str = "db_metadata";

/// Embedded application store.
///
/// Cloning is cheap; clones share the same database handle.
#[derive(Clone, Debug)]
pub struct RedbStore {
    db: Arc<Database>,
    metadata: DatabaseMetadata,
    path: PathBuf,
}

impl RedbStore {
    /// Opens or creates a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is corrupted or missing its metadata
    /// - The file is held open by another process
    /// - The schema version doesn't match
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db_exists = path.exists();

        debug!(db_exists = db_exists, "Opening application store");

        let db = Database::builder().create(path).map_err(|e| match e {
            DatabaseError::DatabaseAlreadyOpen => StorageError::DatabaseLocked,
            other => StorageError::from(other),
        })?;

        if db_exists {
            Self::open_existing(db, path.to_path_buf())
        } else {
            Self::initialize_new(db, path.to_path_buf())
        }
    }

    fn initialize_new(db: Database, path: PathBuf) -> Result<Self> {
        info!("Initializing new application store");

        let metadata = DatabaseMetadata::new();

        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;

            let _ = write_txn.open_table(APPLICATIONS_TABLE)?;
            let _ = write_txn.open_table(EMAIL_INDEX_TABLE)?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        info!(schema_version = SCHEMA_VERSION, "Application store initialized");

        Ok(Self {
            db: Arc::new(db),
            metadata,
            path,
        })
    }

    fn open_existing(db: Database, path: PathBuf) -> Result<Self> {
        let read_txn = db.begin_read().map_err(StorageError::from)?;
        let mut metadata = {
            let meta_table = read_txn.open_table(METADATA_TABLE).map_err(|e| {
                StorageError::corrupted(format!("Cannot open metadata table: {}", e))
            })?;

            let metadata_bytes = meta_table
                .get(METADATA_KEY)
                .map_err(StorageError::from)?
                .ok_or_else(|| StorageError::corrupted("Missing store metadata"))?;

            bincode::deserialize::<DatabaseMetadata>(metadata_bytes.value())
                .map_err(|e| StorageError::corrupted(format!("Invalid metadata format: {}", e)))?
        };
        drop(read_txn);

        if !metadata.is_compatible() {
            warn!(
                expected = SCHEMA_VERSION,
                found = metadata.schema_version,
                "Schema version mismatch"
            );
            return Err(StorageError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found: metadata.schema_version,
            }
            .into());
        }

        metadata.touch();
        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        info!(
            schema_version = metadata.schema_version,
            "Application store opened"
        );

        Ok(Self {
            db: Arc::new(db),
            metadata,
            path,
        })
    }

    /// Returns the store metadata.
    pub fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs a blocking closure against the database on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(StorageError::from)?
    }
}

fn insert_blocking(db: &Database, record: ApplicationRecord) -> Result<Application> {
    let key = email_key(&record.email).to_string();
    let application = Application::new(record);
    let bytes = bincode::serialize(&application)?;

    let write_txn = db.begin_write().map_err(StorageError::from)?;
    let exists = {
        let index = write_txn.open_table(EMAIL_INDEX_TABLE)?;
        let found = index.get(key.as_str())?.is_some();
        found
    };
    if exists {
        write_txn.abort()?;
        return Err(RecruitError::conflict(Field::Email, DUPLICATE_EMAIL_MESSAGE));
    }
    {
        let mut index = write_txn.open_table(EMAIL_INDEX_TABLE)?;
        index.insert(key.as_str(), application.id.as_bytes())?;

        let mut table = write_txn.open_table(APPLICATIONS_TABLE)?;
        table.insert(application.id.as_bytes(), bytes.as_slice())?;
    }
    write_txn.commit().map_err(StorageError::from)?;

    Ok(application)
}

fn find_blocking(db: &Database, key: String) -> Result<Option<ApplicationId>> {
    let read_txn = db.begin_read().map_err(StorageError::from)?;
    let index = read_txn.open_table(EMAIL_INDEX_TABLE)?;
    let found = index
        .get(key.as_str())?
        .map(|guard| ApplicationId::from_bytes(*guard.value()));
    Ok(found)
}

fn list_blocking(db: &Database, filter: ApplicationFilter) -> Result<Vec<Application>> {
    let read_txn = db.begin_read().map_err(StorageError::from)?;
    let table = read_txn.open_table(APPLICATIONS_TABLE)?;

    let mut applications = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry.map_err(StorageError::from)?;
        let application: Application = bincode::deserialize(value.value())?;
        if filter.matches(&application) {
            applications.push(application);
        }
    }

    filter.sort(&mut applications);
    Ok(applications)
}

#[async_trait]
impl ApplicationStore for RedbStore {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn check_configuration(&self) -> Result<()> {
        Ok(())
    }

    #[instrument(skip_all, fields(email = %record.masked_email()))]
    async fn insert(&self, record: &ApplicationRecord) -> Result<Application> {
        let record = record.clone();
        let application = self.blocking(move |db| insert_blocking(db, record)).await?;
        debug!(id = %application.id, "Application stored");
        Ok(application)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ApplicationId>> {
        let key = email_key(email).to_string();
        let found = self.blocking(move |db| find_blocking(db, key)).await?;
        debug!(email = %mask_email(email), found = found.is_some(), "Email lookup");
        Ok(found)
    }

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let filter = filter.clone();
        self.blocking(move |db| list_blocking(db, filter)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(email: &str) -> ApplicationRecord {
        ApplicationRecord::new()
            .with(Field::Name, "Jo Lee")
            .with(Field::Email, email)
            .with(Field::Position, "Design")
    }

    #[test]
    fn test_open_creates_new_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps.db");
        assert!(!path.exists());

        let store = RedbStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.metadata().schema_version, SCHEMA_VERSION);
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_reopen_preserves_created_at() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps.db");

        let store = RedbStore::open(&path).unwrap();
        let created_at = store.metadata().created_at;
        drop(store);

        std::thread::sleep(std::time::Duration::from_millis(10));
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.metadata().created_at, created_at);
        assert!(store.metadata().last_opened_at > created_at);
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps.db");
        drop(RedbStore::open(&path).unwrap());

        {
            let db = Database::create(&path).unwrap();
            let txn = db.begin_write().unwrap();
            {
                let mut table = txn.open_table(METADATA_TABLE).unwrap();
                let mut metadata = DatabaseMetadata::new();
                metadata.schema_version = SCHEMA_VERSION + 1;
                let bytes = bincode::serialize(&metadata).unwrap();
                table.insert(METADATA_KEY, bytes.as_slice()).unwrap();
            }
            txn.commit().unwrap();
        }

        let err = RedbStore::open(&path).unwrap_err();
        assert!(matches!(
            err,
            RecruitError::Storage(StorageError::SchemaVersionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("apps.db")).unwrap();

        let stored = store.insert(&record("jo@x.com")).await.unwrap();
        assert_eq!(stored.created_at, stored.updated_at);

        let found = store.find_by_email("jo@x.com").await.unwrap();
        assert_eq!(found, Some(stored.id));
        assert_eq!(store.find_by_email("sam@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_without_writing() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("apps.db")).unwrap();

        store.insert(&record("jo@x.com")).await.unwrap();
        let err = store.insert(&record("  jo@x.com ")).await.unwrap_err();

        assert!(err.is_conflict());
        match err {
            RecruitError::Conflict { field, message } => {
                assert_eq!(field, Field::Email);
                assert_eq!(message, DUPLICATE_EMAIL_MESSAGE);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let all = store.list(&ApplicationFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_email_match_is_exact_case() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("apps.db")).unwrap();

        store.insert(&record("jo@x.com")).await.unwrap();

        assert_eq!(store.find_by_email("JO@X.COM").await.unwrap(), None);
        assert!(store.find_by_email(" jo@x.com").await.unwrap().is_some());
        store.insert(&record("Jo@x.com")).await.unwrap();

        let all = store.list(&ApplicationFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_list_applies_filter() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("apps.db")).unwrap();

        store.insert(&record("a@x.com")).await.unwrap();
        store
            .insert(&record("b@x.com").with(Field::Position, "Media Team"))
            .await
            .unwrap();

        let filter = ApplicationFilter {
            position: Some("Media Team".into()),
            ..Default::default()
        };
        let media = store.list(&filter).await.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].record.email, "b@x.com");
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps.db");

        let store = RedbStore::open(&path).unwrap();
        let stored = store.insert(&record("jo@x.com")).await.unwrap();
        drop(store);

        let store = RedbStore::open(&path).unwrap();
        let all = store.list(&ApplicationFilter::default()).await.unwrap();
        assert_eq!(all, vec![stored]);
    }
}
