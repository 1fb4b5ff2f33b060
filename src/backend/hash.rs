//! Content hashing for change detection.
//!
//! Rows are fingerprinted by the SHA-256 of their JSON text, so the
//! polling feed can tell an updated row from an untouched one without
//! comparing every column.

use sha2::{Digest, Sha256};

use super::Row;

/// SHA-256 hex digest of a row's JSON text.
///
/// `serde_json::Map` keeps keys sorted, so equal rows hash equally.
#[must_use]
pub fn content_hash(row: &Row) -> String {
    let json = serde_json::Value::Object(row.clone()).to_string();
    digest_hex(json.as_bytes())
}

/// SHA-256 hex digest of raw bytes.
#[must_use]
pub fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Whether a row changed since it was last seen.
///
/// Returns `true` when there is no stored hash or the hashes differ.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}
