//! Content-addressed cache key generation and path derivation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Number of directory levels above each entry.
const DIR_SEGMENTS: usize = 3;

/// Hex characters per directory level.
const SEGMENT_LEN: usize = 3;

/// Build the identity string of a request for cache purposes.
///
/// The URL is followed by the JSON serialization of the form body, if any.
/// `BTreeMap` keeps the serialization key-sorted, so equal forms always
/// produce equal identities.
pub fn request_identity(url: &str, form: Option<&BTreeMap<String, String>>) -> String {
    match form {
        Some(form) => format!("{}{}", url, serde_json::to_string(form).unwrap_or_default()),
        None => url.to_string(),
    }
}

/// Hex SHA-256 digest of a request identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    /// Compute the key for a request identity.
    pub fn from_identity(identity: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The 64-character lowercase hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relative path of an entry: three 3-character directories, then the rest of the digest.
pub fn store_path(key: &StoreKey) -> PathBuf {
    let hex = key.as_str();
    let mut path = PathBuf::new();
    for i in 0..DIR_SEGMENTS {
        path.push(&hex[i * SEGMENT_LEN..(i + 1) * SEGMENT_LEN]);
    }
    path.push(&hex[DIR_SEGMENTS * SEGMENT_LEN..]);
    path
}
