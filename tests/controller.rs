//! Integration tests for the form controller over a direct-write backend.
//!
//! Tests the full stack: FormController -> validation -> duplicate check ->
//! DirectWriteBackend -> ApplicationStore (redb).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use recruit::network::NetworkFlag;
use recruit::storage::{RedbStore, DUPLICATE_EMAIL_MESSAGE};
use recruit::submission::DirectWriteBackend;
use recruit::{
    Ack, Application, ApplicationFilter, ApplicationId, ApplicationRecord, ApplicationStore,
    Config, Field, FormController, NoticeLevel, RecruitError, Result, SubmitOutcome,
};
use tempfile::tempdir;

/// Wraps a real store, counting calls and optionally overriding lookups.
struct CountingStore {
    inner: RedbStore,
    inserts: AtomicUsize,
    lookups: AtomicUsize,
    known_email: Option<&'static str>,
    lookup_fails: bool,
    insert_delay: Duration,
}

impl CountingStore {
    fn new(inner: RedbStore) -> Self {
        Self {
            inner,
            inserts: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            known_email: None,
            lookup_fails: false,
            insert_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl ApplicationStore for CountingStore {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn check_configuration(&self) -> Result<()> {
        self.inner.check_configuration()
    }

    async fn insert(&self, record: &ApplicationRecord) -> Result<Application> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.insert_delay).await;
        self.inner.insert(record).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ApplicationId>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.lookup_fails {
            return Err(RecruitError::unknown("lookup unavailable"));
        }
        if self.known_email == Some(email) {
            return Ok(Some(ApplicationId::new()));
        }
        self.inner.find_by_email(email).await
    }

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        self.inner.list(filter).await
    }
}

fn reference_record() -> ApplicationRecord {
    ApplicationRecord {
        name: "Jo Lee".into(),
        email: "jo@x.com".into(),
        university: "VIT".into(),
        year: "2nd".into(),
        position: "Technical Team".into(),
        skills: "Python, Go, systems design".into(),
        experience: String::new(),
        motivation: "I want to build real infrastructure and learn from peers".into(),
    }
}

fn setup(configure: impl FnOnce(&mut CountingStore)) -> (FormController, Arc<CountingStore>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let inner = RedbStore::open(dir.path().join("apps.db")).unwrap();
    let mut store = CountingStore::new(inner);
    configure(&mut store);
    let store = Arc::new(store);
    let backend = Arc::new(DirectWriteBackend::new(store.clone()));
    let controller = FormController::new(backend);
    (controller, store, dir)
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_reference_record_submits_once_and_resets() {
    let (controller, store, _dir) = setup(|_| {});
    controller.load(reference_record());

    let outcome = controller.submit().await;

    match outcome {
        SubmitOutcome::Submitted { ack, notice } => {
            assert!(ack.is_confirmed());
            assert_eq!(notice.level, NoticeLevel::Success);
            assert_eq!(notice.title, "Application Submitted Successfully!");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    assert!(controller.record().is_empty());
    assert!(controller.errors().is_empty());

    let stored = store.list(&ApplicationFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record, reference_record());
}

#[tokio::test]
async fn test_ack_reference_is_stored_id() {
    let (controller, store, _dir) = setup(|_| {});
    controller.load(reference_record());

    let SubmitOutcome::Submitted { ack, .. } = controller.submit().await else {
        panic!("expected submission");
    };
    let id = store.find_by_email("jo@x.com").await.unwrap().unwrap();
    assert_eq!(
        ack,
        Ack::Confirmed {
            reference: Some(id.to_string())
        }
    );
}

// ============================================================================
// Duplicate check
// ============================================================================

#[tokio::test]
async fn test_known_email_aborts_before_write() {
    let (controller, store, _dir) = setup(|s| s.known_email = Some("a@b.com"));
    controller.load(ApplicationRecord {
        email: "a@b.com".into(),
        ..reference_record()
    });

    let outcome = controller.submit().await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed { ref error, .. } if error.is_conflict()
    ));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    assert_eq!(
        controller.field_error(Field::Email).as_deref(),
        Some(DUPLICATE_EMAIL_MESSAGE)
    );
    assert_eq!(controller.record().email, "a@b.com");
}

#[tokio::test]
async fn test_second_submission_with_same_email_is_caught_by_lookup() {
    let (controller, store, _dir) = setup(|_| {});

    controller.load(reference_record());
    assert!(controller.submit().await.is_submitted());

    controller.load(reference_record());
    let outcome = controller.submit().await;

    assert_eq!(outcome.notice().unwrap().title, "Email Already Registered");
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lookup_failure_fails_open_and_store_still_enforces_uniqueness() {
    let (controller, store, _dir) = setup(|s| s.lookup_fails = true);

    controller.load(reference_record());
    assert!(controller.submit().await.is_submitted());

    controller.load(reference_record());
    let outcome = controller.submit().await;

    // Lookup failed open, so the insert ran and hit the unique index.
    assert_eq!(store.inserts.load(Ordering::SeqCst), 2);
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed { ref error, .. } if error.is_conflict()
    ));
    assert!(controller.field_error(Field::Email).is_some());
}

// ============================================================================
// Preconditions
// ============================================================================

#[tokio::test]
async fn test_offline_makes_no_backend_calls() {
    let (controller, store, _dir) = setup(|_| {});
    let controller = controller.with_network(Arc::new(NetworkFlag::new(false)));
    controller.load(reference_record());

    let outcome = controller.submit().await;

    assert_eq!(outcome.notice().unwrap().title, "No Internet Connection");
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    assert_eq!(controller.record(), reference_record());
}

#[tokio::test]
async fn test_invalid_record_makes_no_backend_calls() {
    let (controller, store, _dir) = setup(|_| {});
    controller.load(ApplicationRecord {
        motivation: "too short".into(),
        ..reference_record()
    });

    let outcome = controller.submit().await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Failed { ref error, .. } if error.is_validation()
    ));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    assert!(controller.field_error(Field::Motivation).is_some());
}

#[tokio::test]
async fn test_unconfigured_database_backend_reports_configuration_error() {
    let config = Config {
        backend: recruit::BackendConfig::Database {
            url: Some("https://your-project-ref.supabase.co".into()),
            api_key: Some("your-anon-key".into()),
        },
        ..Default::default()
    };
    let controller = FormController::from_config(&config).unwrap();
    controller.load(reference_record());

    let outcome = controller.submit().await;

    let notice = outcome.notice().unwrap();
    assert_eq!(notice.title, "Configuration Error");
    assert_eq!(controller.record(), reference_record());
}

// ============================================================================
// Re-entrancy
// ============================================================================

#[tokio::test]
async fn test_double_activation_invokes_backend_once() {
    let (controller, store, _dir) = setup(|s| s.insert_delay = Duration::from_millis(100));
    controller.load(reference_record());

    let (first, second) = tokio::join!(controller.submit(), controller.submit());

    let submitted = [&first, &second].iter().filter(|o| o.is_submitted()).count();
    let ignored = [&first, &second]
        .iter()
        .filter(|o| matches!(o, SubmitOutcome::Ignored))
        .count();
    assert_eq!((submitted, ignored), (1, 1));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    assert!(!controller.is_submitting());
}

#[tokio::test]
async fn test_edits_made_during_submission_survive_success() {
    let (controller, store, _dir) = setup(|s| s.insert_delay = Duration::from_millis(100));
    controller.load(reference_record());

    let (outcome, _) = tokio::join!(controller.submit(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.set_field(Field::Name, "Sam Roe");
    });

    assert!(outcome.is_submitted());
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    assert_eq!(
        controller.record(),
        ApplicationRecord {
            name: "Sam Roe".into(),
            ..reference_record()
        }
    );

    let stored = store.list(&ApplicationFilter::default()).await.unwrap();
    assert_eq!(stored[0].record.name, "Jo Lee");
}

#[tokio::test]
async fn test_flag_cleared_after_failure_allows_retry() {
    let (controller, store, _dir) = setup(|_| {});
    controller.load(ApplicationRecord {
        name: String::new(),
        ..reference_record()
    });
    assert!(!controller.submit().await.is_submitted());
    assert!(!controller.is_submitting());

    controller.set_field(Field::Name, "Jo Lee");
    assert!(controller.submit().await.is_submitted());
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
}
