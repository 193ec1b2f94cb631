//! Content hashing for change detection.
//!
//! Facts are cached against a hash of the directive text that produced them;
//! any textual change to the directive invalidates the cached value. The hash
//! only needs to detect change, not resist an adversary, but it must be
//! stable across process runs on identical input.

use sha2::{Digest, Sha256};

/// Compute the content hash of a directive string.
///
/// # Format
///
/// A full 64-character lowercase hexadecimal SHA-256 digest, e.g.
/// `"fcde2b2edba56bf408601fb721fe9b5c338d10ee429ea04fae5511b68fbf8fb9"`.
pub fn content_hash(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  hex::encode(hasher.finalize())
}
