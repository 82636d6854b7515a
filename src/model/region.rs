//! Region, line and word types.

use crate::geometry::Polygon;
use serde::{Deserialize, Serialize};

/// A region of the page: text block, table or image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    /// Element identifier
    pub id: String,

    /// Outline in pixels
    pub coords: Polygon,

    /// Region variant
    pub kind: RegionKind,

    /// Value of the `custom` attribute
    pub custom: Option<String>,

    /// Table cell role, for regions inside a table
    pub roles: Option<TableCellRole>,

    /// Nested regions (table cells, list items)
    pub regions: Vec<Region>,

    /// Text lines, text regions only
    pub lines: Vec<TextLine>,

    /// Aggregated text, text regions only
    pub text_equiv: Option<TextEquiv>,
}

impl Region {
    fn with_kind(id: impl Into<String>, coords: Polygon, kind: RegionKind) -> Self {
        Self {
            id: id.into(),
            coords,
            kind,
            custom: None,
            roles: None,
            regions: Vec::new(),
            lines: Vec::new(),
            text_equiv: None,
        }
    }

    /// Create a text region without a type.
    pub fn text(id: impl Into<String>, coords: Polygon) -> Self {
        Self::with_kind(id, coords, RegionKind::Text { region_type: None })
    }

    /// Create a table region.
    pub fn table(id: impl Into<String>, coords: Polygon, rows: u32, columns: u32) -> Self {
        Self::with_kind(id, coords, RegionKind::Table { rows, columns })
    }

    /// Create an image region.
    pub fn image(id: impl Into<String>, coords: Polygon) -> Self {
        Self::with_kind(id, coords, RegionKind::Image)
    }

    /// Set the text region type.
    pub fn with_type(mut self, region_type: TextRegionType) -> Self {
        if let RegionKind::Text { region_type: ref mut t } = self.kind {
            *t = Some(region_type);
        }
        self
    }

    /// Set the `custom` attribute.
    pub fn with_custom(mut self, custom: impl Into<String>) -> Self {
        self.custom = Some(custom.into());
        self
    }

    /// PAGE element name of this region.
    pub fn element_name(&self) -> &'static str {
        match self.kind {
            RegionKind::Text { .. } => "TextRegion",
            RegionKind::Table { .. } => "TableRegion",
            RegionKind::Image => "ImageRegion",
        }
    }

    /// Check if this is a text region.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, RegionKind::Text { .. })
    }

    /// Check if this is a table region.
    pub fn is_table(&self) -> bool {
        matches!(self.kind, RegionKind::Table { .. })
    }

    /// Get the aggregated text, if any.
    pub fn text_content(&self) -> Option<&str> {
        self.text_equiv.as_ref().map(|t| t.unicode.as_str())
    }

    pub(crate) fn collect_lines<'a>(&'a self, out: &mut Vec<&'a TextLine>) {
        for region in &self.regions {
            region.collect_lines(out);
        }
        out.extend(self.lines.iter());
    }

    pub(crate) fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.id);
        for region in &self.regions {
            region.collect_ids(out);
        }
        for line in &self.lines {
            out.push(&line.id);
            out.extend(line.words.iter().map(|w| w.id.as_str()));
        }
    }
}

/// Region variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionKind {
    /// `TextRegion`
    Text {
        /// Value of the `type` attribute
        region_type: Option<TextRegionType>,
    },

    /// `TableRegion`
    Table {
        /// Number of rows
        rows: u32,
        /// Number of columns
        columns: u32,
    },

    /// `ImageRegion`
    Image,
}

/// Values of `TextRegion/@type` used by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextRegionType {
    /// paragraph
    Paragraph,
    /// heading
    Heading,
    /// header
    Header,
    /// footer
    Footer,
    /// page-number
    PageNumber,
    /// other
    Other,
}

impl TextRegionType {
    /// Attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextRegionType::Paragraph => "paragraph",
            TextRegionType::Heading => "heading",
            TextRegionType::Header => "header",
            TextRegionType::Footer => "footer",
            TextRegionType::PageNumber => "page-number",
            TextRegionType::Other => "other",
        }
    }
}

/// `Roles/TableCellRole` of a cell region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCellRole {
    /// 0-based row
    pub row_index: u32,
    /// 0-based column
    pub column_index: u32,
    /// Rows spanned
    pub row_span: u32,
    /// Columns spanned
    pub col_span: u32,
    /// Column header cell
    pub header: bool,
}

/// A text line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// Element identifier
    pub id: String,

    /// Outline in pixels
    pub coords: Polygon,

    /// Words in reading order
    pub words: Vec<Word>,

    /// Line text
    pub text_equiv: Option<TextEquiv>,
}

impl TextLine {
    /// Create an empty line.
    pub fn new(id: impl Into<String>, coords: Polygon) -> Self {
        Self {
            id: id.into(),
            coords,
            words: Vec::new(),
            text_equiv: None,
        }
    }

    /// Line text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text_equiv.as_ref().map(|t| t.unicode.as_str())
    }
}

/// A word.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    /// Element identifier
    pub id: String,

    /// Outline in pixels
    pub coords: Polygon,

    /// How the text was produced
    pub production: Option<Production>,

    /// Word text
    pub text_equiv: Option<TextEquiv>,
}

impl Word {
    /// Create a word without text.
    pub fn new(id: impl Into<String>, coords: Polygon) -> Self {
        Self {
            id: id.into(),
            coords,
            production: None,
            text_equiv: None,
        }
    }

    /// Word text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text_equiv.as_ref().map(|t| t.unicode.as_str())
    }
}

/// Values of `Word/@production`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Production {
    /// printed
    Printed,
    /// handwritten-cursive
    HandwrittenCursive,
}

impl Production {
    /// Map a Textract `TextType`.
    pub fn from_text_type(text_type: &str) -> Option<Self> {
        match text_type {
            "PRINTED" => Some(Production::Printed),
            "HANDWRITING" => Some(Production::HandwrittenCursive),
            _ => None,
        }
    }

    /// Attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Production::Printed => "printed",
            Production::HandwrittenCursive => "handwritten-cursive",
        }
    }
}

/// `TextEquiv` with its `Unicode` child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEquiv {
    /// Confidence in `[0, 1]`
    pub conf: Option<f64>,

    /// Text content
    pub unicode: String,
}

impl TextEquiv {
    /// Create a text equivalent.
    pub fn new(unicode: impl Into<String>, conf: Option<f64>) -> Self {
        Self {
            conf,
            unicode: unicode.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> Polygon {
        Polygon::rectangle(0, 0, 5, 5)
    }

    #[test]
    fn test_region_variants() {
        let text = Region::text("t", coords()).with_type(TextRegionType::Heading);
        assert!(text.is_text());
        assert_eq!(text.element_name(), "TextRegion");
        assert_eq!(
            text.kind,
            RegionKind::Text {
                region_type: Some(TextRegionType::Heading)
            }
        );

        let table = Region::table("tb", coords(), 2, 3);
        assert!(table.is_table());
        assert_eq!(table.element_name(), "TableRegion");

        // type only applies to text regions
        let image = Region::image("i", coords()).with_type(TextRegionType::Other);
        assert_eq!(image.kind, RegionKind::Image);
    }

    #[test]
    fn test_production_mapping() {
        assert_eq!(Production::from_text_type("PRINTED"), Some(Production::Printed));
        assert_eq!(
            Production::from_text_type("HANDWRITING").map(|p| p.as_str()),
            Some("handwritten-cursive")
        );
        assert_eq!(Production::from_text_type("STAMP"), None);
    }

    #[test]
    fn test_nested_lines_collected() {
        let mut cell = Region::text("cell", coords());
        cell.lines.push(TextLine::new("l-cell", coords()));
        let mut table = Region::table("table", coords(), 1, 1);
        table.regions.push(cell);

        let mut lines = Vec::new();
        table.collect_lines(&mut lines);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id, "l-cell");
    }

    #[test]
    fn test_text_region_type_names() {
        assert_eq!(TextRegionType::PageNumber.as_str(), "page-number");
        assert_eq!(TextRegionType::Paragraph.as_str(), "paragraph");
    }
}
