//! Mapping of the resolved block tree onto PAGE regions, lines and words.
//!
//! Every node of the tree is visited once, in tree order. Page-level
//! children become top-level regions; lines and words that sit directly
//! under a container unable to hold them get a synthetic wrapper so the
//! output stays schema-valid.

use std::collections::{HashMap, HashSet};

use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::geometry::{self, PageSize, Polygon, RatioGeometry};
use crate::model::{
    Production, ReadingOrder, Region, TableCellRole, TextEquiv, TextLine, TextRegionType, Word,
};
use crate::parser::{Block, BlockKind, LayoutKind, NodeId, ResolvedTree};

/// Identifier of the page-level ordered group.
pub const READING_ORDER_ID: &str = "line_reading_order";

const TABLE_REGION: &str = "table-region";

/// Regions of the page plus the order they were encountered in.
#[derive(Debug, Clone)]
pub struct MappedPage {
    /// Top-level regions in reading order
    pub regions: Vec<Region>,

    /// Explicit reading order of the top-level regions
    pub reading_order: ReadingOrder,
}

/// Walks a [`ResolvedTree`] and produces PAGE elements.
#[derive(Debug, Clone)]
pub struct HierarchyMapper {
    size: PageSize,
    normalize_unicode: bool,
}

impl HierarchyMapper {
    /// Create a mapper for an image of the given size.
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            normalize_unicode: false,
        }
    }

    /// Apply NFC normalization to all text.
    pub fn with_unicode_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Map the whole tree.
    pub fn map(&self, tree: &ResolvedTree<'_>) -> Result<MappedPage> {
        let mut walk = PageWalk::new(self, tree);
        let regions = walk.map_items(tree.root())?;

        let mut reading_order = ReadingOrder::new(READING_ORDER_ID)
            .with_comments("Reading order of lines as defined by Textract.");
        for region in &regions {
            let cells: Vec<String> = region
                .regions
                .iter()
                .filter(|r| r.roles.is_some())
                .map(|r| r.id.clone())
                .collect();
            if region.is_table() && !cells.is_empty() {
                reading_order.push_group(
                    table_group_id(&region.id),
                    "Reading order of this table.",
                    cells,
                );
            } else {
                reading_order.push_region(region.id.clone());
            }
        }

        log::debug!(
            "Mapped {} top-level regions, {} lines",
            regions.len(),
            regions.iter().map(count_lines).sum::<usize>()
        );
        Ok(MappedPage {
            regions,
            reading_order,
        })
    }

    fn map_word(&self, block: &Block, suffix: &str) -> Result<Word> {
        let id = format!("{}{}", block.id, suffix);
        let mut word = Word::new(derive_id("word", &id), self.coords(block)?);
        word.production = block
            .text_type
            .as_deref()
            .and_then(Production::from_text_type);
        word.text_equiv = self.text_equiv(block);
        Ok(word)
    }

    /// Synthetic line around words that have no LINE parent.
    fn word_run_line(&self, words: &[&Block]) -> Result<TextLine> {
        let mapped = words
            .iter()
            .map(|w| self.map_word(w, ""))
            .collect::<Result<Vec<_>>>()?;

        // map_word succeeded, so every polygon has at least three points
        let coords = Polygon::hull(mapped.iter().map(|w| &w.coords))
            .unwrap_or_else(|| Polygon::rectangle(0, 0, 0, 0));
        let mut line = TextLine::new(derive_id("word-line", &words[0].id), coords);

        let texts: Vec<&TextEquiv> = mapped.iter().filter_map(|w| w.text_equiv.as_ref()).collect();
        if !texts.is_empty() {
            let unicode = texts
                .iter()
                .map(|t| t.unicode.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            line.text_equiv = Some(TextEquiv::new(unicode, mean_conf(&texts)));
        }
        line.words = mapped;
        Ok(line)
    }

    /// Wrapper region around a synthetic line.
    fn word_run_region(&self, words: &[&Block]) -> Result<Region> {
        let line = self.word_run_line(words)?;
        let mut region = Region::text(derive_id("word-region", &words[0].id), line.coords.clone());
        region.text_equiv = line.text_equiv.clone();
        region.lines.push(line);
        Ok(region)
    }

    fn coords(&self, block: &Block) -> Result<Polygon> {
        match block.geometry {
            Some(ref geometry) => geometry::to_pixels(&block.id, geometry, self.size),
            None => geometry::to_pixels(&block.id, &RatioGeometry::default(), self.size),
        }
    }

    fn text_equiv(&self, block: &Block) -> Option<TextEquiv> {
        let text = block.text.as_deref().filter(|t| !t.is_empty())?;
        let unicode = if self.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        };
        Some(TextEquiv::new(unicode, block.confidence.map(rescale_confidence)))
    }
}

/// State of one mapping pass.
///
/// Textract lists the words of a table cell under both a LINE and the CELL,
/// and the tree keeps them with the line. Cells get their lines back from
/// here, and those lines are not written a second time outside the table.
struct PageWalk<'m, 't, 'a> {
    mapper: &'m HierarchyMapper,
    tree: &'t ResolvedTree<'a>,
    /// Line holding each word
    word_lines: HashMap<&'a str, NodeId>,
    /// Merged cell spanning each covered cell
    merged_cells: HashMap<&'a str, &'a Block>,
    /// Lines written inside table cells
    cell_lines: HashSet<NodeId>,
    /// Merged cells already written
    merged_done: HashSet<&'a str>,
}

impl<'m, 't, 'a> PageWalk<'m, 't, 'a> {
    fn new(mapper: &'m HierarchyMapper, tree: &'t ResolvedTree<'a>) -> Self {
        let mut word_lines = HashMap::new();
        let mut merged_cells = HashMap::new();
        for (id, node) in tree.iter() {
            match node.kind() {
                BlockKind::Line => {
                    for word in tree.children(id) {
                        if *word.kind() == BlockKind::Word {
                            word_lines.entry(word.id()).or_insert(id);
                        }
                    }
                }
                BlockKind::Table => {
                    let merged = node
                        .block()
                        .merged_cell_ids()
                        .filter_map(|m| tree.lookup(m))
                        .filter(|m| m.block_type == BlockKind::MergedCell && m.has_geometry());
                    for m in merged {
                        for cell in m.child_ids() {
                            merged_cells.entry(cell).or_insert(m);
                        }
                    }
                }
                _ => {}
            }
        }

        let mut walk = Self {
            mapper,
            tree,
            word_lines,
            merged_cells,
            cell_lines: HashSet::new(),
            merged_done: HashSet::new(),
        };

        let mut claimed = HashSet::new();
        for (_, node) in tree.iter() {
            let block = node.block();
            if is_cell(block) && !is_skippable(block) {
                claimed.extend(walk.lines_of_cell(block));
            }
        }
        for m in walk.merged_cells.values() {
            claimed.extend(walk.lines_of_cell(m));
        }
        walk.cell_lines = claimed;
        walk
    }

    /// Lines holding the words of a cell, in word order.
    fn lines_of_cell(&self, cell: &Block) -> Vec<NodeId> {
        let cells: Vec<&Block> = if cell.block_type == BlockKind::MergedCell {
            cell.child_ids()
                .filter_map(|id| self.tree.lookup(id))
                .collect()
        } else {
            vec![cell]
        };

        let mut lines = Vec::new();
        for word in cells.iter().flat_map(|c| c.child_ids()) {
            if let Some(&line) = self.word_lines.get(word) {
                if !lines.contains(&line) {
                    lines.push(line);
                }
            }
        }
        lines
    }

    /// Children of `id`, with geometry-less auxiliary nodes replaced by their
    /// own children and lines that belong to a table cell left out.
    fn visible_children(&self, id: NodeId) -> Vec<NodeId> {
        let tree = self.tree;
        let mut out = Vec::new();
        for &child in tree.node(id).children() {
            let node = tree.node(child);
            if is_skippable(node.block()) {
                log::warn!("Skipping {} block {}: no geometry", node.kind(), node.id());
                out.extend(self.visible_children(child));
            } else if *node.kind() == BlockKind::Line && self.cell_lines.contains(&child) {
                log::debug!("Line {} is written inside its table cell", node.id());
            } else {
                out.push(child);
            }
        }
        out
    }

    /// Map the children of a container that cannot hold lines itself
    /// (page, table, image). Lines and loose words get wrapper regions.
    fn map_items(&mut self, id: NodeId) -> Result<Vec<Region>> {
        let tree = self.tree;
        let children = self.visible_children(id);
        let mut regions = Vec::with_capacity(children.len());
        let mut words: Vec<&Block> = Vec::new();

        for child in children {
            let block = tree.node(child).block();
            if block.block_type == BlockKind::Word {
                words.push(block);
                continue;
            }
            if !words.is_empty() {
                regions.push(self.mapper.word_run_region(&words)?);
                words.clear();
            }
            if block.block_type == BlockKind::Line {
                let line = self.map_line(child, "")?;
                let mut region =
                    Region::text(derive_id("line-region", &block.id), line.coords.clone());
                region.text_equiv = line.text_equiv.clone();
                region.lines.push(line);
                regions.push(region);
            } else if let Some(region) = self.map_child_region(child)? {
                regions.push(region);
            }
        }
        if !words.is_empty() {
            regions.push(self.mapper.word_run_region(&words)?);
        }
        Ok(regions)
    }

    /// Map a region-level node. Cells covered by an already written merged
    /// cell map to nothing.
    fn map_child_region(&mut self, id: NodeId) -> Result<Option<Region>> {
        if is_cell(self.tree.node(id).block()) {
            self.map_cell(id)
        } else {
            self.map_region(id).map(Some)
        }
    }

    /// Map a region-level node and everything below it.
    fn map_region(&mut self, id: NodeId) -> Result<Region> {
        let tree = self.tree;
        let block = tree.node(id).block();
        let coords = self.mapper.coords(block)?;

        let mut region = match &block.block_type {
            BlockKind::Layout(LayoutKind::Figure) => {
                Region::image(derive_id("layout-image-region", &block.id), coords)
                    .with_custom(layout_custom(LayoutKind::Figure))
            }
            BlockKind::Layout(kind) => {
                Region::text(derive_id("layout-text-region", &block.id), coords)
                    .with_type(layout_region_type(*kind))
                    .with_custom(layout_custom(*kind))
            }
            BlockKind::Table => {
                let (rows, columns) = table_extent(tree, id);
                Region::table(derive_id(TABLE_REGION, &block.id), coords, rows, columns)
            }
            other => Region::text(derive_id("region", &block.id), coords).with_custom(format!(
                "textract-block-type: {};",
                other.as_str().to_lowercase()
            )),
        };

        if region.is_text() {
            self.fill_text_region(id, &mut region)?;
        } else {
            region.regions = self.map_items(id)?;
        }
        Ok(region)
    }

    /// Map a table cell, or the merged cell spanning it.
    ///
    /// Line and word ids get the cell's row and column appended, since a
    /// line running across cells is written once per cell.
    fn map_cell(&mut self, id: NodeId) -> Result<Option<Region>> {
        let tree = self.tree;
        let block = tree.node(id).block();
        let cell = self.merged_cells.get(block.id.as_str()).copied().unwrap_or(block);
        if cell.block_type == BlockKind::MergedCell && !self.merged_done.insert(cell.id.as_str()) {
            return Ok(None);
        }

        let role = cell_role(cell);
        let mut region = Region::text(derive_id("cell-region", &cell.id), self.mapper.coords(cell)?);
        region.roles = Some(role);

        let suffix = format!("-{}-{}", role.row_index, role.column_index);
        for line in self.lines_of_cell(cell) {
            region.lines.push(self.map_line(line, &suffix)?);
        }

        if std::ptr::eq(cell, block) {
            self.fill_text_region(id, &mut region)?;
        } else {
            region.text_equiv = aggregate_text(&region.lines);
        }
        Ok(Some(region))
    }

    /// Put lines, loose words and nested regions under a text region.
    fn fill_text_region(&mut self, id: NodeId, region: &mut Region) -> Result<()> {
        let tree = self.tree;
        let mut words: Vec<&Block> = Vec::new();
        for child in self.visible_children(id) {
            let block = tree.node(child).block();
            if block.block_type == BlockKind::Word {
                words.push(block);
                continue;
            }
            if !words.is_empty() {
                region.lines.push(self.mapper.word_run_line(&words)?);
                words.clear();
            }
            if block.block_type == BlockKind::Line {
                region.lines.push(self.map_line(child, "")?);
            } else if let Some(nested) = self.map_child_region(child)? {
                region.regions.push(nested);
            }
        }
        if !words.is_empty() {
            region.lines.push(self.mapper.word_run_line(&words)?);
        }

        region.text_equiv = aggregate_text(&region.lines);
        Ok(())
    }

    fn map_line(&self, id: NodeId, suffix: &str) -> Result<TextLine> {
        let block = self.tree.node(id).block();
        let line_id = format!("{}{}", block.id, suffix);
        let mut line = TextLine::new(derive_id("line", &line_id), self.mapper.coords(block)?);
        line.text_equiv = self.mapper.text_equiv(block);

        for child in self.tree.children(id) {
            if *child.kind() == BlockKind::Word {
                line.words.push(self.mapper.map_word(child.block(), suffix)?);
            } else {
                log::warn!(
                    "Dropping {} block {} inside line {}: lines hold words only",
                    child.kind(),
                    child.id(),
                    block.id
                );
            }
        }
        Ok(line)
    }
}

/// Auxiliary blocks without geometry, which have no place on the page.
///
/// Lines, words and the page itself are never skipped; a line or word
/// without geometry is an error instead.
fn is_skippable(block: &Block) -> bool {
    !matches!(
        block.block_type,
        BlockKind::Page | BlockKind::Line | BlockKind::Word
    ) && !block.has_geometry()
}

fn is_cell(block: &Block) -> bool {
    matches!(block.block_type, BlockKind::Cell | BlockKind::MergedCell)
}

/// `table_{id}_reading_order`, from the Textract id behind a table region.
fn table_group_id(region_id: &str) -> String {
    let source = region_id
        .strip_prefix(TABLE_REGION)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(region_id);
    format!("table_{}_reading_order", source)
}

/// Build an element identifier from a prefix and a Textract id.
///
/// Characters that may not appear in an XML `NCName` are replaced with `_`.
pub fn derive_id(prefix: &str, id: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1 + id.len());
    out.push_str(prefix);
    out.push('-');
    out.extend(
        id.chars()
            .map(|c| if is_name_char(c) { c } else { '_' }),
    );
    out
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '\u{B7}')
}

/// Textract confidences are percentages; PAGE wants `[0, 1]`.
pub fn rescale_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    (confidence / 100.0).clamp(0.0, 1.0)
}

fn layout_region_type(kind: LayoutKind) -> TextRegionType {
    match kind {
        LayoutKind::Title | LayoutKind::SectionHeader => TextRegionType::Heading,
        LayoutKind::Header => TextRegionType::Header,
        LayoutKind::Footer => TextRegionType::Footer,
        LayoutKind::PageNumber => TextRegionType::PageNumber,
        LayoutKind::Text => TextRegionType::Paragraph,
        LayoutKind::List | LayoutKind::Figure | LayoutKind::Table | LayoutKind::KeyValue => {
            TextRegionType::Other
        }
    }
}

fn layout_custom(kind: LayoutKind) -> String {
    format!("textract-layout-type: {};", kind.short_name())
}

/// Row and column count of a table, from the cells below it.
fn table_extent(tree: &ResolvedTree<'_>, id: NodeId) -> (u32, u32) {
    let mut rows = 0;
    let mut columns = 0;
    for child in tree.children(id) {
        let block = child.block();
        if !matches!(block.block_type, BlockKind::Cell | BlockKind::MergedCell) {
            continue;
        }
        let role = cell_role(block);
        rows = rows.max(role.row_index + role.row_span);
        columns = columns.max(role.column_index + role.col_span);
    }
    (rows, columns)
}

fn cell_role(block: &Block) -> TableCellRole {
    TableCellRole {
        row_index: block.row_index.unwrap_or(1).saturating_sub(1),
        column_index: block.column_index.unwrap_or(1).saturating_sub(1),
        row_span: block.row_span.unwrap_or(1).max(1),
        col_span: block.column_span.unwrap_or(1).max(1),
        header: block.has_entity_type("COLUMN_HEADER"),
    }
}

/// Region text: line texts joined by newlines, mean line confidence.
fn aggregate_text(lines: &[TextLine]) -> Option<TextEquiv> {
    let texts: Vec<&TextEquiv> = lines.iter().filter_map(|l| l.text_equiv.as_ref()).collect();
    if texts.is_empty() {
        return None;
    }
    let unicode = texts
        .iter()
        .map(|t| t.unicode.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    Some(TextEquiv::new(unicode, mean_conf(&texts)))
}

fn mean_conf(texts: &[&TextEquiv]) -> Option<f64> {
    let confs: Vec<f64> = texts.iter().filter_map(|t| t.conf).collect();
    if confs.is_empty() {
        None
    } else {
        Some(confs.iter().sum::<f64>() / confs.len() as f64)
    }
}

fn count_lines(region: &Region) -> usize {
    region.lines.len() + region.regions.iter().map(count_lines).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{RatioBox, RatioGeometry};
    use crate::model::{OrderEntry, RegionKind};
    use crate::parser::{resolve, ParseOptions};

    fn boxed(left: f64, top: f64, width: f64, height: f64) -> RatioGeometry {
        RatioGeometry::from_box(RatioBox {
            left,
            top,
            width,
            height,
        })
    }

    fn page(children: &[&str]) -> Block {
        Block::new("page", BlockKind::Page)
            .with_geometry(boxed(0.0, 0.0, 1.0, 1.0))
            .with_children(children.iter().copied())
    }

    fn line(id: &str, text: &str, children: &[&str]) -> Block {
        Block::new(id, BlockKind::Line)
            .with_geometry(boxed(0.1, 0.1, 0.3, 0.05))
            .with_text(text, 90.0)
            .with_children(children.iter().copied())
    }

    fn word(id: &str, text: &str) -> Block {
        Block::new(id, BlockKind::Word)
            .with_geometry(boxed(0.1, 0.1, 0.1, 0.05))
            .with_text(text, 80.0)
    }

    fn cell(id: &str, row: u32, col: u32, words: &[&str]) -> Block {
        let mut b = Block::new(id, BlockKind::Cell)
            .with_geometry(boxed(0.1, 0.1, 0.1, 0.1))
            .with_children(words.iter().copied());
        b.row_index = Some(row);
        b.column_index = Some(col);
        b
    }

    fn map(blocks: &[Block]) -> MappedPage {
        let tree = resolve(blocks, &ParseOptions::default()).unwrap();
        HierarchyMapper::new(PageSize::new(1000, 2000))
            .map(&tree)
            .unwrap()
    }

    fn map_lenient(blocks: &[Block]) -> MappedPage {
        let tree = resolve(blocks, &ParseOptions::default().lenient()).unwrap();
        HierarchyMapper::new(PageSize::new(1000, 2000))
            .map(&tree)
            .unwrap()
    }

    fn line_ids(region: &Region) -> Vec<&str> {
        region.lines.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_line_under_page_gets_region() {
        let blocks = vec![page(&["l1"]), line("l1", "Hello", &["w1"]), word("w1", "Hello")];
        let mapped = map(&blocks);

        assert_eq!(mapped.regions.len(), 1);
        let region = &mapped.regions[0];
        assert_eq!(region.id, "line-region-l1");
        assert_eq!(region.lines[0].id, "line-l1");
        assert_eq!(region.lines[0].words[0].id, "word-w1");
        assert_eq!(region.text_content(), Some("Hello"));
        assert_eq!(region.lines[0].text_equiv.as_ref().and_then(|t| t.conf), Some(0.9));

        assert_eq!(
            mapped.reading_order.entries,
            vec![OrderEntry::Region {
                index: 0,
                region_ref: "line-region-l1".into()
            }]
        );
    }

    #[test]
    fn test_layout_region_type() {
        let blocks = vec![
            page(&["t"]),
            Block::new("t", BlockKind::Layout(LayoutKind::Title))
                .with_geometry(boxed(0.1, 0.1, 0.5, 0.1))
                .with_children(["l1"]),
            line("l1", "Chapter One", &[]),
        ];
        let mapped = map(&blocks);
        let region = &mapped.regions[0];
        assert_eq!(region.id, "layout-text-region-t");
        assert_eq!(
            region.kind,
            RegionKind::Text {
                region_type: Some(TextRegionType::Heading)
            }
        );
        assert_eq!(region.custom.as_deref(), Some("textract-layout-type: title;"));
        assert_eq!(region.lines.len(), 1);
    }

    #[test]
    fn test_figure_nests_lines_in_regions() {
        let blocks = vec![
            page(&["f"]),
            Block::new("f", BlockKind::Layout(LayoutKind::Figure))
                .with_geometry(boxed(0.0, 0.0, 0.5, 0.5))
                .with_children(["l1"]),
            line("l1", "caption", &[]),
        ];
        let mapped = map(&blocks);
        let figure = &mapped.regions[0];
        assert_eq!(figure.kind, RegionKind::Image);
        assert!(figure.lines.is_empty());
        assert_eq!(figure.regions[0].id, "line-region-l1");
    }

    #[test]
    fn test_table_cells_and_group() {
        let mut header = cell("c1", 1, 1, &[]);
        header.entity_types = vec!["COLUMN_HEADER".into()];
        let blocks = vec![
            page(&["tbl"]),
            Block::new("tbl", BlockKind::Table)
                .with_geometry(boxed(0.0, 0.0, 0.5, 0.5))
                .with_children(["c1", "c2", "c3"]),
            header,
            cell("c2", 1, 2, &[]),
            cell("c3", 2, 1, &[]),
        ];
        let mapped = map(&blocks);
        let table = &mapped.regions[0];
        assert_eq!(
            table.kind,
            RegionKind::Table {
                rows: 2,
                columns: 2
            }
        );
        let first = table.regions[0].roles.unwrap();
        assert_eq!((first.row_index, first.column_index), (0, 0));
        assert!(first.header);
        assert!(!table.regions[1].roles.unwrap().header);

        match &mapped.reading_order.entries[0] {
            OrderEntry::Group { id, region_refs, .. } => {
                assert_eq!(id, "table_tbl_reading_order");
                assert_eq!(region_refs.len(), 3);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_loose_words_get_synthetic_line() {
        let blocks = vec![
            page(&["k"]),
            Block::new("k", BlockKind::KeyValueSet)
                .with_geometry(boxed(0.0, 0.0, 0.5, 0.1))
                .with_children(["w1", "w2"]),
            word("w1", "Name"),
            word("w2", "Smith"),
        ];
        let mapped = map(&blocks);
        let region = &mapped.regions[0];
        assert_eq!(region.id, "region-k");
        assert_eq!(region.custom.as_deref(), Some("textract-block-type: key_value_set;"));
        assert_eq!(region.lines.len(), 1);
        assert_eq!(region.lines[0].id, "word-line-w1");
        assert_eq!(region.lines[0].text(), Some("Name Smith"));
        assert_eq!(region.lines[0].words.len(), 2);
    }

    #[test]
    fn test_empty_block_hoists_children() {
        let blocks = vec![
            page(&["x"]),
            Block::new("x", BlockKind::from("MYSTERY")).with_children(["l1"]),
            line("l1", "kept", &[]),
        ];
        let mapped = map(&blocks);
        assert_eq!(mapped.regions.len(), 1);
        assert_eq!(mapped.regions[0].id, "line-region-l1");
    }

    #[test]
    fn test_auxiliary_block_without_geometry_is_skipped() {
        let blocks = vec![
            page(&["q", "l1"]),
            Block::new("q", BlockKind::from("QUERY_RESULT"))
                .with_text("answer", 70.0)
                .with_children(["l2"]),
            line("l1", "kept", &[]),
            line("l2", "hoisted", &[]),
        ];
        let mapped = map(&blocks);
        let ids: Vec<_> = mapped.regions.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["line-region-l2", "line-region-l1"]);
    }

    #[test]
    fn test_cells_take_their_lines() {
        let blocks = vec![
            page(&["l1", "l2", "tbl"]),
            line("l1", "Name", &["w1"]),
            line("l2", "John Smith", &["w2", "w3"]),
            word("w1", "Name"),
            word("w2", "John"),
            word("w3", "Smith"),
            Block::new("tbl", BlockKind::Table)
                .with_geometry(boxed(0.0, 0.0, 0.5, 0.5))
                .with_children(["c1", "c2"]),
            cell("c1", 1, 1, &["w1"]),
            cell("c2", 1, 2, &["w2", "w3"]),
        ];
        let mapped = map_lenient(&blocks);

        // the lines live in the table only
        assert_eq!(mapped.regions.len(), 1);
        let table = &mapped.regions[0];
        assert_eq!(table.id, "table-region-tbl");

        let (c1, c2) = (&table.regions[0], &table.regions[1]);
        assert_eq!(line_ids(c1), vec!["line-l1-0-0"]);
        assert_eq!(c1.lines[0].words[0].id, "word-w1-0-0");
        assert_eq!(c1.text_content(), Some("Name"));

        assert_eq!(line_ids(c2), vec!["line-l2-0-1"]);
        assert_eq!(c2.lines[0].words.len(), 2);
        assert_eq!(c2.text_content(), Some("John Smith"));
    }

    #[test]
    fn test_line_across_cells_is_repeated() {
        let blocks = vec![
            page(&["l1", "tbl"]),
            line("l1", "Total 42", &["w1", "w2"]),
            word("w1", "Total"),
            word("w2", "42"),
            Block::new("tbl", BlockKind::Table)
                .with_geometry(boxed(0.0, 0.0, 0.5, 0.5))
                .with_children(["c1", "c2"]),
            cell("c1", 1, 1, &["w1"]),
            cell("c2", 1, 2, &["w2"]),
        ];
        let mapped = map_lenient(&blocks);
        let table = &mapped.regions[0];
        assert_eq!(line_ids(&table.regions[0]), vec!["line-l1-0-0"]);
        assert_eq!(line_ids(&table.regions[1]), vec!["line-l1-0-1"]);
        assert_eq!(table.regions[1].lines[0].words[1].id, "word-w2-0-1");
    }

    #[test]
    fn test_merged_cell_replaces_covered_cells() {
        let mut merged = Block::new("m1", BlockKind::MergedCell)
            .with_geometry(boxed(0.0, 0.0, 0.5, 0.1))
            .with_children(["c1", "c2"]);
        merged.row_index = Some(1);
        merged.column_index = Some(1);
        merged.column_span = Some(2);

        let blocks = vec![
            page(&["l1", "l2", "tbl"]),
            line("l1", "Quarterly", &["w1"]),
            line("l2", "Q1", &["w2"]),
            word("w1", "Quarterly"),
            word("w2", "Q1"),
            Block::new("tbl", BlockKind::Table)
                .with_geometry(boxed(0.0, 0.0, 0.5, 0.5))
                .with_children(["c1", "c2", "c3"])
                .with_merged_cells(["m1"]),
            merged,
            cell("c1", 1, 1, &["w1"]),
            cell("c2", 1, 2, &[]),
            cell("c3", 2, 1, &["w2"]),
        ];
        let mapped = map_lenient(&blocks);
        let table = &mapped.regions[0];
        assert_eq!(
            table.kind,
            RegionKind::Table {
                rows: 2,
                columns: 2
            }
        );

        let ids: Vec<_> = table.regions.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["cell-region-m1", "cell-region-c3"]);
        let role = table.regions[0].roles.unwrap();
        assert_eq!((role.row_index, role.column_index, role.col_span), (0, 0, 2));
        assert_eq!(line_ids(&table.regions[0]), vec!["line-l1-0-0"]);
        assert_eq!(line_ids(&table.regions[1]), vec!["line-l2-1-0"]);

        match &mapped.reading_order.entries[0] {
            OrderEntry::Group { region_refs, .. } => {
                assert_eq!(region_refs, &["cell-region-m1", "cell-region-c3"]);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_line_without_geometry_fails() {
        let blocks = vec![
            page(&["l1"]),
            Block::new("l1", BlockKind::Line).with_text("x", 50.0),
        ];
        let tree = resolve(&blocks, &ParseOptions::default()).unwrap();
        let result = HierarchyMapper::new(PageSize::new(10, 10)).map(&tree);
        assert!(matches!(
            result,
            Err(crate::Error::DegenerateGeometry { ref id, .. }) if id == "l1"
        ));
    }

    #[test]
    fn test_unicode_normalization() {
        let blocks = vec![page(&["l1"]), line("l1", "e\u{301}", &[])];
        let tree = resolve(&blocks, &ParseOptions::default()).unwrap();
        let mapper = HierarchyMapper::new(PageSize::new(100, 100));

        let raw = mapper.map(&tree).unwrap();
        assert_eq!(raw.regions[0].text_content(), Some("e\u{301}"));

        let nfc = mapper.with_unicode_normalization(true).map(&tree).unwrap();
        assert_eq!(nfc.regions[0].text_content(), Some("\u{e9}"));
    }

    #[test]
    fn test_derive_id_sanitizes() {
        assert_eq!(derive_id("line", "abc-123"), "line-abc-123");
        assert_eq!(derive_id("word", "a:b c/d"), "word-a_b_c_d");
    }

    #[test]
    fn test_rescale_confidence() {
        assert_eq!(rescale_confidence(99.5), 0.995);
        assert_eq!(rescale_confidence(150.0), 1.0);
        assert_eq!(rescale_confidence(-3.0), 0.0);
    }
}
