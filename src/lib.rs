//! # textract2page
//!
//! Convert AWS Textract OCR output into PRIMA PAGE-XML.
//!
//! Textract reports a page as a flat list of blocks with ratio-based
//! geometry. This library resolves the blocks into a page > region >
//! line > word hierarchy, scales every outline to pixel coordinates of the
//! page image and writes a PAGE 2019-07-15 document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use textract2page::{convert_file, render, ConvertOptions};
//!
//! fn main() -> textract2page::Result<()> {
//!     let options = ConvertOptions::new().with_image("scan.png");
//!     let doc = convert_file("scan.json", &options)?;
//!
//!     let xml = render::to_xml(&doc, &render::RenderOptions::default())?;
//!     println!("{}", xml);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Strict or lenient resolution**: reject or repair shared children,
//!   dangling references and orphaned blocks
//! - **Layout and tables**: `LAYOUT_*` blocks become typed text regions,
//!   tables become table regions with cell roles
//! - **Reading order**: encounter order is recorded explicitly
//! - **Deterministic output**: the same input always yields the same bytes

pub mod convert;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use convert::{ConvertOptions, PageConverter};
pub use detect::{image_dimensions, resolve_page_size};
pub use error::{Error, Result};
pub use geometry::{PageSize, Point, Polygon};
pub use model::{Metadata, Page, PcGts, Region, TextLine, Word};
pub use parser::{Block, BlockKind, ErrorMode, ParseOptions, TextractResponse};
pub use render::{JsonFormat, RenderOptions};

use std::path::Path;

/// Convert a Textract JSON file.
///
/// # Example
///
/// ```no_run
/// use textract2page::{convert_file, ConvertOptions};
///
/// let options = ConvertOptions::new().with_image_size(2480, 3508);
/// let doc = convert_file("scan.json", &options).unwrap();
/// println!("Lines: {}", doc.page.lines().len());
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<PcGts> {
    PageConverter::new(options.clone()).convert_file(path)
}

/// Convert Textract JSON text.
pub fn convert_str(json: &str, options: &ConvertOptions) -> Result<PcGts> {
    PageConverter::new(options.clone()).convert_str(json)
}

/// Convert Textract JSON bytes.
pub fn convert_bytes(data: &[u8], options: &ConvertOptions) -> Result<PcGts> {
    PageConverter::new(options.clone()).convert_bytes(data)
}

/// Convert a block collection that is already in memory.
pub fn convert_blocks(blocks: &[Block], options: &ConvertOptions) -> Result<PcGts> {
    PageConverter::new(options.clone()).convert_blocks(blocks)
}

/// Convert a Textract JSON file straight to a PAGE-XML string.
///
/// # Example
///
/// ```no_run
/// use textract2page::{to_page_xml, ConvertOptions};
///
/// let options = ConvertOptions::new().with_image("scan.png");
/// let xml = to_page_xml("scan.json", &options).unwrap();
/// std::fs::write("scan.xml", xml).unwrap();
/// ```
pub fn to_page_xml<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<String> {
    let doc = convert_file(path, options)?;
    render::to_xml(&doc, &RenderOptions::default())
}

/// Builder for converting and rendering Textract output.
///
/// # Example
///
/// ```no_run
/// use textract2page::Textract2Page;
///
/// let xml = Textract2Page::new()
///     .with_image("scan.png")
///     .lenient()
///     .convert("scan.json")?
///     .to_xml()?;
/// # Ok::<(), textract2page::Error>(())
/// ```
pub struct Textract2Page {
    convert_options: ConvertOptions,
    render_options: RenderOptions,
}

impl Textract2Page {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            convert_options: ConvertOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Enable lenient resolution.
    pub fn lenient(mut self) -> Self {
        self.convert_options = self.convert_options.lenient();
        self
    }

    /// Set the page image to measure and reference.
    pub fn with_image(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.convert_options = self.convert_options.with_image(path);
        self
    }

    /// Set the page size explicitly.
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.convert_options = self.convert_options.with_image_size(width, height);
        self
    }

    /// Set the image filename written to the document.
    pub fn with_image_filename(mut self, filename: impl Into<String>) -> Self {
        self.convert_options = self.convert_options.with_image_filename(filename);
        self
    }

    /// Leave out the reading order.
    pub fn without_reading_order(mut self) -> Self {
        self.convert_options = self.convert_options.with_reading_order(false);
        self
    }

    /// Apply NFC normalization to text.
    pub fn with_unicode_normalization(mut self) -> Self {
        self.convert_options = self.convert_options.with_unicode_normalization(true);
        self
    }

    /// Set the creation timestamp.
    pub fn with_timestamp(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.convert_options = self.convert_options.with_timestamp(timestamp);
        self
    }

    /// Set the XML indentation width.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.render_options = self.render_options.with_indent(indent);
        self
    }

    /// Convert a Textract JSON file.
    pub fn convert<P: AsRef<Path>>(self, path: P) -> Result<ConversionResult> {
        let document = PageConverter::new(self.convert_options).convert_file(path)?;
        Ok(ConversionResult {
            document,
            render_options: self.render_options,
        })
    }

    /// Convert Textract JSON text.
    pub fn convert_str(self, json: &str) -> Result<ConversionResult> {
        let document = PageConverter::new(self.convert_options).convert_str(json)?;
        Ok(ConversionResult {
            document,
            render_options: self.render_options,
        })
    }
}

impl Default for Textract2Page {
    fn default() -> Self {
        Self::new()
    }
}

/// A converted document ready to be rendered.
pub struct ConversionResult {
    /// The converted document
    pub document: PcGts,
    /// Render options to use
    render_options: RenderOptions,
}

impl ConversionResult {
    /// Render as PAGE-XML.
    pub fn to_xml(&self) -> Result<String> {
        render::to_xml(&self.document, &self.render_options)
    }

    /// Render as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Get the plain text of all lines.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Get the document.
    pub fn document(&self) -> &PcGts {
        &self.document
    }
}
