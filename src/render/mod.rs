//! Rendering module for writing documents to output formats.

mod json;
mod options;
mod text;
mod xml;

pub use json::{to_json, JsonFormat};
pub use options::{RenderOptions, PAGE_NAMESPACE, PAGE_SCHEMA_LOCATION};
pub use text::to_text;
pub use xml::{to_xml, to_xml_bytes};
