use crate::registry::BundleRegistry;

/// Leading character marking a path list entry as a bundle alias rather than a file.
pub const ALIAS_SIGIL: char = '#';

/// Returns `true` when `value` refers to a registered bundle instead of a source file.
pub fn is_alias(value: &str) -> bool {
    value.starts_with(ALIAS_SIGIL)
}

/// Resolve a caller-supplied path list into canonical, order-preserving source paths.
///
/// When the first entry is an alias the registered list is returned and the remaining entries
/// are ignored; an unknown alias yields an empty list. Otherwise every path is lowercased.
/// Duplicates are kept because they deliberately duplicate content in the output.
pub fn normalize_paths<S: AsRef<str>>(paths: &[S], registry: &BundleRegistry) -> Vec<String> {
    match paths.first().map(AsRef::as_ref) {
        Some(first) if is_alias(first) => registry.resolve(first),
        _ => paths
            .iter()
            .map(|path| path.as_ref().to_lowercase())
            .collect(),
    }
}
