use quickurl_core::Result;
use sqlx::SqlitePool;
use tracing::debug;

use crate::sqlite::map_sqlx_error;

/// DDL for the `urls` table and its indexes.
///
/// Every statement uses `IF NOT EXISTS`, so applying it to an initialised
/// database leaves the existing table and indexes untouched.
pub const SQLITE_SCHEMA: &str = include_str!("../ddl/sqlite/urls.sql");

/// Applies [`SQLITE_SCHEMA`] to the database behind `pool`.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SQLITE_SCHEMA)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;

    debug!("sqlite schema applied");
    Ok(())
}
