use async_trait::async_trait;
use jiff::Timestamp;
use quickurl_core::{
    Clock, ListQuery, NewUrl, ReadStore, RecordId, Result, StoreError, SystemClock, Token,
    UrlRecord, UrlStore, Visibility,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};

use crate::schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

// SQLite primary result codes (extended code & 0xff).
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;
const SQLITE_IOERR: i64 = 10;
const SQLITE_FULL: i64 = 13;
const SQLITE_CANTOPEN: i64 = 14;

const SELECT_COLUMNS: &str =
    "id, token, original_url, title, created_at, expires_at, click_count";

/// SQLite implementation of the store contract.
///
/// Expiry is enforced inside each statement (`expires_at > ?now`) so a
/// lookup or increment never acts on a record that expired between two
/// round trips. Timestamps are stored as unix epoch milliseconds.
#[derive(Debug, Clone)]
pub struct SqliteStore<C = SystemClock> {
    pool: SqlitePool,
    clock: C,
}

impl SqliteStore {
    /// Creates a store from an existing pool. The schema is not applied.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, SystemClock)
    }

    /// Opens (creating if missing) the database at `database_url` and
    /// applies the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }
}

impl<C: Clock> SqliteStore<C> {
    pub fn with_clock(pool: SqlitePool, clock: C) -> Self {
        Self { pool, clock }
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Idempotently creates the `urls` table and its indexes.
    pub async fn migrate(&self) -> Result<()> {
        schema::apply(&self.pool).await
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().as_millisecond()
    }

    /// Lower bound on `expires_at` for the given visibility.
    ///
    /// `Any` uses `i64::MIN` so a single statement serves both views.
    fn expiry_floor(&self, visibility: Visibility) -> i64 {
        match visibility {
            Visibility::Live => self.now_millis(),
            Visibility::Any => i64::MIN,
        }
    }
}

fn parse_millis(column: &str, value: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(value).map_err(|e| {
        StoreError::InvalidData(format!("invalid {column} timestamp '{value}': {e}"))
    })
}

fn record_from_row(row: &SqliteRow) -> Result<UrlRecord> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let token: String = row.try_get("token").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let title: Option<String> = row.try_get("title").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: i64 = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let click_count: i64 = row.try_get("click_count").map_err(map_sqlx_error)?;

    Ok(UrlRecord {
        id: RecordId::new(id),
        token: Token::new_unchecked(token),
        original_url,
        title,
        created_at: parse_millis("created_at", created_at)?,
        expires_at: parse_millis("expires_at", expires_at)?,
        click_count: u64::try_from(click_count).map_err(|_| {
            StoreError::InvalidData(format!("negative click_count '{click_count}'"))
        })?,
    })
}

fn is_token_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db| {
        db.is_unique_violation() && db.message().contains("urls.token")
    })
}

fn primary_result_code(db: &dyn sqlx::error::DatabaseError) -> Option<i64> {
    db.code()
        .and_then(|code| code.parse::<i64>().ok())
        .map(|code| code & 0xff)
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::Database(ref db) => match primary_result_code(&**db) {
            Some(SQLITE_BUSY | SQLITE_LOCKED) => StoreError::Timeout(message),
            Some(SQLITE_IOERR | SQLITE_FULL | SQLITE_CANTOPEN) => {
                StoreError::Unavailable(message)
            }
            _ => StoreError::Query(message),
        },
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

#[async_trait]
impl<C: Clock> ReadStore for SqliteStore<C> {
    async fn lookup_by_token(&self, token: &Token, visibility: Visibility) -> Result<UrlRecord> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM urls WHERE token = ? AND expires_at > ? LIMIT 1"
        );

        let row = sqlx::query(&sql)
            .bind(token.as_str())
            .bind(self.expiry_floor(visibility))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => record_from_row(&row),
            None => {
                trace!(token = %token, ?visibility, "token not found");
                Err(StoreError::NotFound(token.to_string()))
            }
        }
    }

    async fn lookup_by_id(&self, id: &RecordId, visibility: Visibility) -> Result<UrlRecord> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM urls WHERE id = ? AND expires_at > ? LIMIT 1");

        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .bind(self.expiry_floor(visibility))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<UrlRecord>> {
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM urls
            WHERE expires_at > ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        );

        let limit = i64::try_from(query.page_size()).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let rows = sqlx::query(&sql)
            .bind(self.expiry_floor(query.visibility))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }
}

#[async_trait]
impl<C: Clock> UrlStore for SqliteStore<C> {
    async fn create(&self, new: NewUrl) -> Result<UrlRecord> {
        let record = UrlRecord::from_new(new, RecordId::generate(), self.clock.now())?;

        // The UNIQUE constraint on `token` makes check-and-insert atomic.
        let result = sqlx::query(
            r#"
            INSERT INTO urls (id, token, original_url, title, created_at, expires_at, click_count)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.token.as_str())
        .bind(record.original_url.as_str())
        .bind(record.title.as_deref())
        .bind(record.created_at.as_millisecond())
        .bind(record.expires_at.as_millisecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(id = %record.id, token = %record.token, expires_at = %record.expires_at, "record created");
                Ok(record)
            }
            Err(err) if is_token_violation(&err) => {
                debug!(token = %record.token, "token already taken");
                Err(StoreError::DuplicateToken(record.token.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn record_click(&self, token: &Token) -> Result<UrlRecord> {
        // Single-statement read-modify-write; SQLite serialises writers.
        let sql = format!(
            r#"
            UPDATE urls
            SET click_count = click_count + 1
            WHERE token = ?
              AND expires_at > ?
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(token.as_str())
            .bind(self.now_millis())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(StoreError::NotFound(token.to_string())),
        }
    }

    async fn sweep(&self, now: Timestamp) -> Result<u64> {
        let result = sqlx::query("DELETE FROM urls WHERE expires_at <= ?")
            .bind(now.as_millisecond())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let removed = result.rows_affected();
        debug!(removed, now = %now, "sweep finished");
        Ok(removed)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let result = sqlx::query("DELETE FROM urls WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        debug!(id = %id, "record deleted");
        Ok(())
    }
}
