//! Storage backends for QuickURL records.
//!
//! [`InMemoryStore`] keeps everything in sharded maps with ordered secondary
//! indexes; [`SqliteStore`] persists to SQLite through `sqlx`. Both implement
//! the [`UrlStore`] contract from `quickurl_core` with the same semantics.

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use quickurl_core::{ReadStore, Result, StoreError, UrlStore};
pub use sqlite::SqliteStore;
