//! Persisting bundle files and rendering the markup that references them.

pub mod render;
pub mod writer;

pub use render::{render_references, script_element, style_link};
pub use writer::BundleWriter;
