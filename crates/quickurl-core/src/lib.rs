//! Core types and traits for the QuickURL shortener.
//!
//! This crate holds the URL record model and the store contract shared by
//! the storage backends, the shortener service and the HTTP gateway.

pub mod clock;
pub mod error;
pub mod record;
pub mod store;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StoreError};
pub use record::{Expiry, ListQuery, NewUrl, RecordId, UrlRecord, Visibility};
pub use store::{ReadStore, UrlStore};
pub use token::Token;
