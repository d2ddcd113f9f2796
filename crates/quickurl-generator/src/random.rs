use crate::Generator;
use quickurl_core::Token;
use rand::Rng;
use typed_builder::TypedBuilder;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_LENGTH: usize = 6;
pub const MAX_LENGTH: usize = Token::MAX_LEN;

/// Random alphanumeric tokens.
///
/// With the default length of 6 there are 62^6 (about 5.7e10) possible
/// tokens, so collisions are rare but possible.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomGenerator {
    #[builder(default = DEFAULT_LENGTH, setter(transform = |len: usize| len.clamp(1, MAX_LENGTH)))]
    length: usize,
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RandomGenerator {
    pub fn with_length(length: usize) -> Self {
        Self::builder().length(length).build()
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Generator for RandomGenerator {
    type Output = Token;

    fn generate(&self) -> Token {
        let mut rng = rand::thread_rng();
        let token: String = (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Token::new_unchecked(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_length_is_six() {
        let generator = RandomGenerator::default();
        assert_eq!(generator.length(), 6);
        assert_eq!(generator.generate().as_str().len(), 6);
    }

    #[test]
    fn tokens_are_alphanumeric_and_valid() {
        let generator = RandomGenerator::with_length(12);

        for _ in 0..100 {
            let token = generator.generate();
            assert_eq!(token.as_str().len(), 12);
            assert!(token.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(Token::new(token.as_str()).is_ok());
        }
    }

    #[test]
    fn length_is_clamped() {
        assert_eq!(RandomGenerator::with_length(0).length(), 1);
        assert_eq!(RandomGenerator::with_length(500).length(), MAX_LENGTH);
    }

    #[test]
    fn tokens_differ() {
        let generator = RandomGenerator::with_length(16);
        let tokens: HashSet<String> = (0..1000)
            .map(|_| generator.generate().as_str().to_string())
            .collect();
        assert_eq!(tokens.len(), 1000);
    }
}
