use sha2::{Digest, Sha256};

use crate::models::Tag;

/// Number of digest bytes kept in a tag. 128 bits rendered as 32 hex characters.
const TAG_DIGEST_BYTES: usize = 16;

/// Derive the resolution cache key for an already normalised path list.
///
/// Paths are joined with `|` before hashing, so the key is sensitive to order and to
/// duplicated entries.
pub fn key_for_paths<S: AsRef<str>>(paths: &[S]) -> String {
    let joined = paths
        .iter()
        .map(|path| path.as_ref())
        .collect::<Vec<_>>()
        .join("|");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compute the tag for a bundle's final content: `prefix` followed by a lowercase hex digest.
pub fn content_tag(prefix: &str, content: &str) -> Tag {
    let digest = Sha256::digest(content.as_bytes());
    let hex = digest[..TAG_DIGEST_BYTES]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();

    Tag::new(format!("{prefix}{hex}"))
}
