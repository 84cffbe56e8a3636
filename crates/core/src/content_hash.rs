//! Content-derived identity of an uploaded image.
//!
//! A [`ContentHash`] is the lowercase hex SHA-256 of the raw upload bytes.
//! It doubles as the name of the result directory, so the only way to build
//! one from client input is [`ContentHash::parse`], which accepts nothing but
//! 64 lowercase hex characters.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Fingerprint raw image bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Parse a client-supplied hash.
    ///
    /// Anything that is not exactly a lowercase hex SHA-256 digest is
    /// reported as an unknown hash: such a value can never name a stored
    /// result.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let well_formed = raw.len() == SHA256_HEX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(CoreError::NotFound {
                entity: "Hash",
                id: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
