//! Markup templates for referencing bundles and individual sources.

use crate::models::AssetKind;

/// Stylesheet link element for `url`.
pub fn style_link(url: &str) -> String {
  format!("<link rel=\"stylesheet\" href=\"{url}\" />")
}

/// Script element for `url`.
pub fn script_element(url: &str) -> String {
  format!("<script type=\"text/javascript\" src=\"{url}\"></script>")
}

/// Render one reference element per URL, in order, separated by newlines.
///
/// Scripts get script elements; every other kind is referenced as a stylesheet.
pub fn render_references<S: AsRef<str>>(kind: AssetKind, urls: &[S]) -> String {
  urls
    .iter()
    .map(|url| match kind {
      AssetKind::Script => script_element(url.as_ref()),
      _ => style_link(url.as_ref()),
    })
    .collect::<Vec<_>>()
    .join("\n")
}
