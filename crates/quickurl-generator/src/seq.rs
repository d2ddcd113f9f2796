use crate::error::GeneratorError;
use crate::Generator;
use quickurl_core::Token;
use std::sync::atomic::{AtomicU64, Ordering};

const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Characters needed to write `u64::MAX` in base 62.
const MAX_DIGITS: usize = 11;

/// Counter digits are left-padded to this width.
pub const MIN_WIDTH: usize = 6;

/// Sequential tokens: a fixed prefix followed by a base-62 counter.
///
/// `SeqGenerator::new("qu")` yields `qu000000`, `qu000001`, ... `qu00000z`,
/// `qu000010`. Tokens are unique within one generator; processes sharing a
/// store should use distinct prefixes.
#[derive(Debug)]
pub struct SeqGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SeqGenerator {
    /// Longest prefix that still leaves room for every counter value.
    pub const MAX_PREFIX_LEN: usize = Token::MAX_LEN - MAX_DIGITS;

    /// Creates a generator counting from zero.
    ///
    /// The prefix may be empty. It must consist of token characters and be
    /// at most [`SeqGenerator::MAX_PREFIX_LEN`] long, so every generated
    /// token is valid.
    pub fn new(prefix: impl Into<String>) -> Result<Self, GeneratorError> {
        let prefix = prefix.into();

        if !prefix.chars().all(Token::is_token_char) {
            return Err(GeneratorError::InvalidPrefix(prefix));
        }
        if prefix.len() > Self::MAX_PREFIX_LEN {
            return Err(GeneratorError::PrefixTooLong {
                prefix,
                max: Self::MAX_PREFIX_LEN,
            });
        }

        Ok(Self {
            prefix,
            next: AtomicU64::new(0),
        })
    }

    /// Continues counting from `next`, e.g. after a restart.
    pub fn starting_at(self, next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
            ..self
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

fn encode(mut n: u64) -> String {
    let mut digits = Vec::with_capacity(MAX_DIGITS);
    loop {
        digits.push(DIGITS[(n % 62) as usize]);
        n /= 62;
        if n == 0 {
            break;
        }
    }
    while digits.len() < MIN_WIDTH {
        digits.push(b'0');
    }
    digits.iter().rev().map(|&d| d as char).collect()
}

impl Generator for SeqGenerator {
    type Output = Token;

    fn generate(&self) -> Token {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Token::new_unchecked(format!("{}{}", self.prefix, encode(n)))
    }
}
