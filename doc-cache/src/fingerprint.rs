//! Cache keys derived from a page URL and extraction mode.

use std::fmt;

use docground_utils_url::normalize_url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

/// Deterministic cache key: SHA-256 over the normalized URL and the
/// extraction mode, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of a hex encoded SHA-256 digest.
    const HEX_LEN: usize = 64;

    /// Fingerprint of `url` extracted under `mode`.
    pub fn of(url: &str, mode: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize_url(url).as_bytes());
        hasher.update(b"\n");
        hasher.update(mode.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse an existing fingerprint, e.g. one given on the command line.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim().to_ascii_lowercase();
        if value.len() == Self::HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(value))
        } else {
            Err(CacheError::InvalidFingerprint(value))
        }
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}
