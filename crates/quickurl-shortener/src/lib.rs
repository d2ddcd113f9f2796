pub mod error;
pub mod service;
pub mod shortener;
pub mod sweeper;

pub use error::{Result, ShortenerError};
pub use service::{ShortenerService, ShortenerSettings};
pub use shortener::{ExpirationPolicy, ShortenParams, Shortener};
pub use sweeper::Sweeper;
