pub mod error;
pub mod random;
pub mod seq;

pub use error::GeneratorError;
pub use random::RandomGenerator;
pub use seq::SeqGenerator;

use quickurl_core::Token;

/// Trait for generating tokens.
///
/// Implementations are pure generators that don't interact with storage.
/// A generated token may still collide with one already stored; callers
/// that need a guaranteed slot retry on `DuplicateToken`.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<Token>;

    /// Generates a candidate token.
    fn generate(&self) -> Self::Output;
}

impl<G: Generator> Generator for std::sync::Arc<G> {
    type Output = G::Output;

    fn generate(&self) -> Self::Output {
        (**self).generate()
    }
}
