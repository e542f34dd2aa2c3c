//! Helpers for turning caller-supplied path lists into canonical, hashable form.
//!
//! Responsibilities are split into focused submodules so that alias resolution, key and tag
//! hashing, URL construction and input validation can be tested independently.
//!
//! Paths are lowercased during normalisation to maximise cache hits. This assumes the
//! underlying filesystem is case-insensitive: on a case-sensitive filesystem two sources that
//! differ only in case collapse onto the same lowercased path.

mod filters;
mod keys;
mod normalize;
mod urls;

pub use filters::is_valid_tag_prefix;
pub use keys::{content_tag, key_for_paths};
pub use normalize::{ALIAS_SIGIL, is_alias, normalize_paths};
pub use urls::join_url;
