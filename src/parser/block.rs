//! Textract response types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::RatioGeometry;

/// Top-level Textract response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextractResponse {
    /// Response metadata (page count)
    #[serde(default)]
    pub document_metadata: Option<DocumentMetadata>,

    /// All detected blocks, in no particular order
    #[serde(alias = "nodes")]
    pub blocks: Vec<Block>,
}

impl TextractResponse {
    /// Parse a response from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let response: Self = serde_json::from_str(json)?;
        response.check_single_page()?;
        Ok(response)
    }

    /// Parse a response from JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let response: Self = serde_json::from_slice(data)?;
        response.check_single_page()?;
        Ok(response)
    }

    fn check_single_page(&self) -> Result<()> {
        match self.document_metadata {
            Some(DocumentMetadata { pages }) if pages > 1 => Err(Error::MalformedInput(format!(
                "response describes {} pages, only single-page responses are supported",
                pages
            ))),
            _ => Ok(()),
        }
    }
}

/// `DocumentMetadata` section of a response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentMetadata {
    /// Number of pages analyzed
    pub pages: u32,
}

/// A single Textract block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    /// Unique identifier
    pub id: String,

    /// Block type
    pub block_type: BlockKind,

    /// Ratio-space geometry
    #[serde(default)]
    pub geometry: Option<RatioGeometry>,

    /// Recognized text (LINE, WORD)
    #[serde(default)]
    pub text: Option<String>,

    /// Confidence, 0-100
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Relationships to other blocks
    #[serde(default)]
    pub relationships: Vec<Relationship>,

    /// PRINTED or HANDWRITING
    #[serde(default)]
    pub text_type: Option<String>,

    /// Entity types (KEY, VALUE, COLUMN_HEADER, ...)
    #[serde(default)]
    pub entity_types: Vec<String>,

    /// 1-based table row of a cell
    #[serde(default)]
    pub row_index: Option<u32>,

    /// 1-based table column of a cell
    #[serde(default)]
    pub column_index: Option<u32>,

    /// Rows spanned by a cell
    #[serde(default)]
    pub row_span: Option<u32>,

    /// Columns spanned by a cell
    #[serde(default)]
    pub column_span: Option<u32>,

    /// SELECTED or NOT_SELECTED
    #[serde(default)]
    pub selection_status: Option<String>,
}

impl Block {
    /// Create a block with no geometry, text or relationships.
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            block_type: kind,
            geometry: None,
            text: None,
            confidence: None,
            relationships: Vec::new(),
            text_type: None,
            entity_types: Vec::new(),
            row_index: None,
            column_index: None,
            row_span: None,
            column_span: None,
            selection_status: None,
        }
    }

    /// Set the geometry.
    pub fn with_geometry(mut self, geometry: RatioGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set the recognized text and confidence.
    pub fn with_text(mut self, text: impl Into<String>, confidence: f64) -> Self {
        self.text = Some(text.into());
        self.confidence = Some(confidence);
        self
    }

    /// Append a CHILD relationship.
    pub fn with_children<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships.push(Relationship {
            kind: RelationshipKind::Child,
            ids: ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Append a MERGED_CELL relationship (TABLE blocks).
    pub fn with_merged_cells<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships.push(Relationship {
            kind: RelationshipKind::MergedCell,
            ids: ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Identifiers of CHILD relationships, in source order.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.related_ids(RelationshipKind::Child)
    }

    /// Identifiers of MERGED_CELL relationships, in source order.
    pub fn merged_cell_ids(&self) -> impl Iterator<Item = &str> {
        self.related_ids(RelationshipKind::MergedCell)
    }

    fn related_ids(&self, kind: RelationshipKind) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .filter(move |rel| rel.kind == kind)
            .flat_map(|rel| rel.ids.iter().map(String::as_str))
    }

    /// Check if the block carries any geometry.
    pub fn has_geometry(&self) -> bool {
        self.geometry.as_ref().is_some_and(|g| !g.is_empty())
    }

    /// Check if the block carries non-empty text.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Check if an entity type is present.
    pub fn has_entity_type(&self, entity: &str) -> bool {
        self.entity_types.iter().any(|e| e == entity)
    }
}

/// A typed edge list of a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship kind
    #[serde(rename = "Type")]
    pub kind: RelationshipKind,

    /// Target identifiers
    #[serde(rename = "Ids", default)]
    pub ids: Vec<String>,
}

/// Relationship kinds. Only `Child` edges shape the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipKind {
    /// Parent/child containment
    Child,
    /// TABLE to the merged cells spanning its cells
    MergedCell,
    /// Any other kind (VALUE, COMPLEX_FEATURES, ...)
    Other(String),
}

impl From<String> for RelationshipKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CHILD" => RelationshipKind::Child,
            "MERGED_CELL" => RelationshipKind::MergedCell,
            _ => RelationshipKind::Other(s),
        }
    }
}

impl From<RelationshipKind> for String {
    fn from(kind: RelationshipKind) -> Self {
        match kind {
            RelationshipKind::Child => "CHILD".to_string(),
            RelationshipKind::MergedCell => "MERGED_CELL".to_string(),
            RelationshipKind::Other(s) => s,
        }
    }
}

/// Layout element kinds reported by the Layout feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// LAYOUT_TITLE
    Title,
    /// LAYOUT_HEADER
    Header,
    /// LAYOUT_FOOTER
    Footer,
    /// LAYOUT_SECTION_HEADER
    SectionHeader,
    /// LAYOUT_PAGE_NUMBER
    PageNumber,
    /// LAYOUT_LIST
    List,
    /// LAYOUT_FIGURE
    Figure,
    /// LAYOUT_TABLE
    Table,
    /// LAYOUT_KEY_VALUE
    KeyValue,
    /// LAYOUT_TEXT
    Text,
}

impl LayoutKind {
    const ALL: [LayoutKind; 10] = [
        LayoutKind::Title,
        LayoutKind::Header,
        LayoutKind::Footer,
        LayoutKind::SectionHeader,
        LayoutKind::PageNumber,
        LayoutKind::List,
        LayoutKind::Figure,
        LayoutKind::Table,
        LayoutKind::KeyValue,
        LayoutKind::Text,
    ];

    /// Textract block type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKind::Title => "LAYOUT_TITLE",
            LayoutKind::Header => "LAYOUT_HEADER",
            LayoutKind::Footer => "LAYOUT_FOOTER",
            LayoutKind::SectionHeader => "LAYOUT_SECTION_HEADER",
            LayoutKind::PageNumber => "LAYOUT_PAGE_NUMBER",
            LayoutKind::List => "LAYOUT_LIST",
            LayoutKind::Figure => "LAYOUT_FIGURE",
            LayoutKind::Table => "LAYOUT_TABLE",
            LayoutKind::KeyValue => "LAYOUT_KEY_VALUE",
            LayoutKind::Text => "LAYOUT_TEXT",
        }
    }

    /// Lowercase suffix, e.g. `section_header`.
    pub fn short_name(&self) -> String {
        self.as_str().trim_start_matches("LAYOUT_").to_lowercase()
    }

    fn parse(s: &str) -> Option<Self> {
        // LAYOUT_KEY_VALUE_SET is an older spelling of LAYOUT_KEY_VALUE
        if s == "LAYOUT_KEY_VALUE_SET" {
            return Some(LayoutKind::KeyValue);
        }
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

/// Closed set of block types with a fallback for anything unrecognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    /// PAGE
    Page,
    /// LINE
    Line,
    /// WORD
    Word,
    /// LAYOUT_*
    Layout(LayoutKind),
    /// TABLE
    Table,
    /// CELL
    Cell,
    /// MERGED_CELL
    MergedCell,
    /// TABLE_TITLE
    TableTitle,
    /// TABLE_FOOTER
    TableFooter,
    /// SELECTION_ELEMENT
    SelectionElement,
    /// KEY_VALUE_SET
    KeyValueSet,
    /// Anything else the provider emits
    Unrecognized(String),
}

impl BlockKind {
    /// Textract block type name.
    pub fn as_str(&self) -> &str {
        match self {
            BlockKind::Page => "PAGE",
            BlockKind::Line => "LINE",
            BlockKind::Word => "WORD",
            BlockKind::Layout(kind) => kind.as_str(),
            BlockKind::Table => "TABLE",
            BlockKind::Cell => "CELL",
            BlockKind::MergedCell => "MERGED_CELL",
            BlockKind::TableTitle => "TABLE_TITLE",
            BlockKind::TableFooter => "TABLE_FOOTER",
            BlockKind::SelectionElement => "SELECTION_ELEMENT",
            BlockKind::KeyValueSet => "KEY_VALUE_SET",
            BlockKind::Unrecognized(s) => s,
        }
    }

    /// Position in the page > region > line > word hierarchy.
    ///
    /// Everything that is neither page, line nor word sits at region level.
    pub fn level(&self) -> u8 {
        match self {
            BlockKind::Page => 0,
            BlockKind::Line => 2,
            BlockKind::Word => 3,
            _ => 1,
        }
    }
}

impl From<&str> for BlockKind {
    fn from(s: &str) -> Self {
        match s {
            "PAGE" => BlockKind::Page,
            "LINE" => BlockKind::Line,
            "WORD" => BlockKind::Word,
            "TABLE" => BlockKind::Table,
            "CELL" => BlockKind::Cell,
            "MERGED_CELL" => BlockKind::MergedCell,
            "TABLE_TITLE" => BlockKind::TableTitle,
            "TABLE_FOOTER" => BlockKind::TableFooter,
            "SELECTION_ELEMENT" => BlockKind::SelectionElement,
            "KEY_VALUE_SET" => BlockKind::KeyValueSet,
            other => LayoutKind::parse(other)
                .map(BlockKind::Layout)
                .unwrap_or_else(|| BlockKind::Unrecognized(other.to_string())),
        }
    }
}

impl From<String> for BlockKind {
    fn from(s: String) -> Self {
        BlockKind::from(s.as_str())
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
