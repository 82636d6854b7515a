//! Conversion pipeline from Textract blocks to a PAGE document.
//!
//! The pipeline runs in four steps:
//!
//! 1. decide the page size ([`crate::detect`]),
//! 2. resolve the flat block list into a tree ([`crate::parser`]),
//! 3. map the tree onto regions, lines and words ([`HierarchyMapper`]),
//! 4. wrap the result into a validated document ([`Assembler`]).
//!
//! # Example
//!
//! ```no_run
//! use textract2page::convert::{ConvertOptions, PageConverter};
//!
//! fn main() -> textract2page::Result<()> {
//!     let options = ConvertOptions::new()
//!         .with_image_size(1000, 2000)
//!         .with_image_filename("scan.png");
//!     let doc = PageConverter::new(options).convert_file("scan.json")?;
//!     println!("{}", doc.plain_text());
//!     Ok(())
//! }
//! ```

mod assemble;
mod mapper;

pub use assemble::{validate, Assembler};
pub use mapper::{derive_id, rescale_confidence, HierarchyMapper, MappedPage, READING_ORDER_ID};

use crate::detect;
use crate::error::Result;
use crate::geometry::PageSize;
use crate::model::{Metadata, PcGts};
use crate::parser::{self, Block, ParseOptions, TextractResponse};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Options for a conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Block graph resolution options
    pub parse: ParseOptions,

    /// Explicit page size; takes precedence over the image
    pub image_size: Option<PageSize>,

    /// Page image, measured when no explicit size is given
    pub image_path: Option<PathBuf>,

    /// Value of `Page/@imageFilename`
    pub image_filename: Option<String>,

    /// Emit the `ReadingOrder` element
    pub reading_order: bool,

    /// Apply NFC normalization to text
    pub normalize_unicode: bool,

    /// `Metadata/Creator`
    pub creator: Option<String>,

    /// `Metadata/Created` and `Metadata/LastChange`
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            image_size: None,
            image_path: None,
            image_filename: None,
            reading_order: true,
            normalize_unicode: false,
            creator: None,
            timestamp: None,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set block graph resolution options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Accept shared children, dangling references and unreachable blocks.
    pub fn lenient(mut self) -> Self {
        self.parse = self.parse.lenient();
        self
    }

    /// Set the page size in pixels.
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = Some(PageSize::new(width, height));
        self
    }

    /// Set the page image to measure.
    ///
    /// Also used as the image filename unless one is set explicitly.
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    /// Set the image filename written to the document.
    pub fn with_image_filename(mut self, filename: impl Into<String>) -> Self {
        self.image_filename = Some(filename.into());
        self
    }

    /// Enable or disable the reading order.
    pub fn with_reading_order(mut self, enabled: bool) -> Self {
        self.reading_order = enabled;
        self
    }

    /// Enable or disable NFC normalization.
    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }

    /// Set the creator string.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Set the creation timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Page size after applying the explicit size / image precedence.
    pub fn page_size(&self) -> Result<PageSize> {
        detect::resolve_page_size(self.image_size, self.image_path.as_deref())
    }

    /// Image filename to record in the document.
    pub fn resolved_image_filename(&self) -> String {
        match (&self.image_filename, &self.image_path) {
            (Some(name), _) => name.clone(),
            (None, Some(path)) => path.to_string_lossy().into_owned(),
            (None, None) => String::new(),
        }
    }

    fn metadata(&self) -> Metadata {
        let creator = self
            .creator
            .clone()
            .unwrap_or_else(Metadata::default_creator);
        let timestamp = self.timestamp.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Metadata::new(creator, timestamp)
    }
}

/// Runs the conversion pipeline with fixed options.
#[derive(Debug, Clone, Default)]
pub struct PageConverter {
    options: ConvertOptions,
}

impl PageConverter {
    /// Create a converter.
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a block collection.
    pub fn convert_blocks(&self, blocks: &[Block]) -> Result<PcGts> {
        let size = self.options.page_size()?;
        let assembler = Assembler::new(
            self.options.resolved_image_filename(),
            size,
            self.options.metadata(),
        )?
        .with_reading_order(self.options.reading_order);

        let tree = parser::resolve(blocks, &self.options.parse)?;
        let mapped = HierarchyMapper::new(size)
            .with_unicode_normalization(self.options.normalize_unicode)
            .map(&tree)?;

        let doc = assembler.assemble(mapped)?;
        log::info!(
            "Converted {} blocks into {} lines on a {} page",
            blocks.len(),
            doc.page.lines().len(),
            size
        );
        Ok(doc)
    }

    /// Convert a parsed response.
    pub fn convert_response(&self, response: &TextractResponse) -> Result<PcGts> {
        self.convert_blocks(&response.blocks)
    }

    /// Convert JSON text.
    pub fn convert_str(&self, json: &str) -> Result<PcGts> {
        let response = TextractResponse::from_json(json)?;
        self.convert_response(&response)
    }

    /// Convert JSON bytes.
    pub fn convert_bytes(&self, data: &[u8]) -> Result<PcGts> {
        let response = TextractResponse::from_slice(data)?;
        self.convert_response(&response)
    }

    /// Convert a JSON file.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<PcGts> {
        let path = path.as_ref();
        log::debug!("Reading {}", path.display());
        let data = std::fs::read(path)?;
        self.convert_bytes(&data)
    }
}
