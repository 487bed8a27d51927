//! SHA-256 integrity verification of downloaded archives.

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};
use sha2::digest::Output;
use sha2::{Digest, Sha256};

use crate::error::DigestMismatch;

/// A SHA-256 digest as 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Parse a hex digest. Uppercase input is normalised to lowercase.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.len() != 64 {
            return Err(format!("expected 64 hex characters, got {}", value.len()));
        }
        if let Some(c) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(format!("invalid hex character {:?}", c));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Digest of an in-memory byte sequence.
    pub fn of(bytes: &[u8]) -> Self {
        Self::from_digest(Sha256::digest(bytes))
    }

    fn from_digest(digest: Output<Sha256>) -> Self {
        Self(format!("{:x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against another digest without stopping at the first
    /// differing character.
    pub fn matches(&self, other: &Sha256Hash) -> bool {
        let a = self.0.as_bytes();
        let b = other.0.as_bytes();
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl TryFrom<String> for Sha256Hash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Sha256Hash> for String {
    fn from(value: Sha256Hash) -> Self {
        value.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a stream in fixed-size chunks.
pub fn compute_sha256_reader<R: Read>(reader: &mut R) -> std::io::Result<Sha256Hash> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Sha256Hash::from_digest(hasher.finalize()))
}

/// Confirm that `bytes` hash to `expected`.
///
/// A mismatch is always fatal; there is no partial-trust fallback.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn verify(bytes: &[u8], expected: &Sha256Hash) -> Result<(), DigestMismatch> {
    let actual = Sha256Hash::of(bytes);
    if actual.matches(expected) {
        log::debug!("sha256 verified: {}", actual);
        Ok(())
    } else {
        Err(DigestMismatch {
            expected: expected.clone(),
            actual,
        })
    }
}
