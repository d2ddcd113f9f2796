use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use quickurl_core::{
    Clock, ManualClock, NewUrl, ReadStore, StoreError, Token, UrlStore, Visibility,
};
use quickurl_storage::SqliteStore;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

struct Fixture {
    store: SqliteStore<ManualClock>,
    clock: ManualClock,
}

impl Fixture {
    async fn start() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("open sqlite");

        let clock = ManualClock::new(t0());
        let store = SqliteStore::with_clock(pool, clock.clone());
        store.migrate().await.expect("create schema");

        Self { store, clock }
    }
}

/// A file-backed database so several pooled connections share one store.
struct FileFixture {
    _dir: TempDir,
    store: Arc<SqliteStore>,
}

impl FileFixture {
    async fn start() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = format!("sqlite://{}", dir.path().join("quickurl.db").display());
        let store = SqliteStore::connect(&url).await.expect("connect sqlite");

        Self {
            _dir: dir,
            store: Arc::new(store),
        }
    }
}

fn t0() -> Timestamp {
    Timestamp::from_second(1_700_000_000).unwrap()
}

fn token(value: &str) -> Token {
    Token::new(value).unwrap()
}

fn new_url(t: &str, ttl: SignedDuration) -> NewUrl {
    NewUrl::builder()
        .token(token(t))
        .original_url("https://example.com")
        .expiry(ttl)
        .build()
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let fixture = Fixture::start().await;

    fixture.store.migrate().await.unwrap();
    fixture.store.migrate().await.unwrap();

    fixture
        .store
        .create(new_url("abc123", SignedDuration::from_secs(60)))
        .await
        .unwrap();
}

#[tokio::test]
async fn schema_declares_expected_indexes() {
    let fixture = Fixture::start().await;

    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'urls' AND name LIKE 'idx_%' ORDER BY name",
    )
    .fetch_all(fixture.store.pool())
    .await
    .unwrap();

    assert_eq!(
        names,
        ["idx_urls_created_at", "idx_urls_expires_at", "idx_urls_token"]
    );
}

#[tokio::test]
async fn timestamps_are_stored_as_epoch_millis() {
    let fixture = Fixture::start().await;
    fixture
        .clock
        .set(t0() + SignedDuration::from_nanos(1_234_567));

    let created = fixture
        .store
        .create(new_url("millis", SignedDuration::from_secs(60)))
        .await
        .unwrap();

    let (created_at, expires_at): (i64, i64) =
        sqlx::query_as("SELECT created_at, expires_at FROM urls WHERE token = ?")
            .bind("millis")
            .fetch_one(fixture.store.pool())
            .await
            .unwrap();

    assert_eq!(created_at, t0().as_millisecond() + 1);
    assert_eq!(expires_at, created_at + 60_000);
    assert_eq!(created.created_at.as_millisecond(), created_at);

    let found = fixture
        .store
        .lookup_by_token(&token("millis"), Visibility::Live)
        .await
        .unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn corrupt_click_count_is_invalid_data() {
    let fixture = Fixture::start().await;
    fixture
        .store
        .create(new_url("broken", SignedDuration::from_secs(60)))
        .await
        .unwrap();

    sqlx::query("UPDATE urls SET click_count = -1 WHERE token = ?")
        .bind("broken")
        .execute(fixture.store.pool())
        .await
        .unwrap();

    let err = fixture
        .store
        .lookup_by_token(&token("broken"), Visibility::Live)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[tokio::test]
async fn expired_but_unswept_token_is_still_taken() {
    let fixture = Fixture::start().await;
    fixture
        .store
        .create(new_url("stale", SignedDuration::from_secs(1)))
        .await
        .unwrap();

    fixture.clock.advance(SignedDuration::from_secs(5));

    let err = fixture
        .store
        .create(new_url("stale", SignedDuration::from_secs(60)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateToken(_)));

    let removed = fixture.store.sweep(fixture.clock.now()).await.unwrap();
    assert_eq!(removed, 1);

    fixture
        .store
        .create(new_url("stale", SignedDuration::from_secs(60)))
        .await
        .unwrap();
}

#[tokio::test]
async fn closed_pool_is_retryable() {
    let fixture = Fixture::start().await;
    fixture.store.pool().close().await;

    let err = fixture
        .store
        .lookup_by_token(&token("abc123"), Visibility::Live)
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "unexpected error: {err:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost() {
    let fixture = FileFixture::start().await;
    fixture
        .store
        .create(new_url("hot", SignedDuration::from_secs(3600)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = Arc::clone(&fixture.store);
        handles.push(tokio::spawn(async move {
            store.increment_clicks(&token("hot")).await.unwrap()
        }));
    }

    let mut seen = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=50).collect::<Vec<u64>>());

    let record = fixture
        .store
        .lookup_by_token(&token("hot"), Visibility::Live)
        .await
        .unwrap();
    assert_eq!(record.click_count, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_same_token() {
    let fixture = FileFixture::start().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&fixture.store);
        handles.push(tokio::spawn(async move {
            store
                .create(new_url("race", SignedDuration::from_secs(3600)))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(StoreError::DuplicateToken(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(created, 1);
}
