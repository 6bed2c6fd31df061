/*!
 * Content fingerprinting for cache addressing.
 *
 * A fingerprint is the truncated SHA-256 of all caption texts concatenated in
 * order. Timestamps do not participate, so re-timed copies of the same lecture
 * share a cache entry.
 */

use sha2::{Digest, Sha256};
use std::fmt;

use crate::captions::CaptionItem;

/// Number of hex characters kept from the digest
pub const FINGERPRINT_LENGTH: usize = 16;

/// Stable identifier of a caption list's text content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an existing fingerprint string (e.g. read back from a cache key)
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The fingerprint as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a caption list
pub fn fingerprint(items: &[CaptionItem]) -> Fingerprint {
    let mut hasher = Sha256::new();
    for item in items {
        hasher.update(item.text.as_bytes());
    }
    let digest = hasher.finalize();

    let hex: String = digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>();

    Fingerprint(hex[..FINGERPRINT_LENGTH].to_string())
}
