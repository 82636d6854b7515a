//! Page-level types.

use super::{Region, TextLine, Word};
use serde::{Deserialize, Serialize};

/// The `Page` element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Image file the coordinates refer to
    pub image_filename: String,

    /// Image width in pixels
    pub image_width: u32,

    /// Image height in pixels
    pub image_height: u32,

    /// Explicit reading order of the top-level regions
    pub reading_order: Option<ReadingOrder>,

    /// Regions in reading order
    pub regions: Vec<Region>,
}

impl Page {
    /// Create a new empty page.
    pub fn new(image_filename: impl Into<String>, image_width: u32, image_height: u32) -> Self {
        Self {
            image_filename: image_filename.into(),
            image_width,
            image_height,
            reading_order: None,
            regions: Vec::new(),
        }
    }

    /// Add a region to the page.
    pub fn add_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    /// Check if the page has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All text lines, depth first.
    pub fn lines(&self) -> Vec<&TextLine> {
        let mut out = Vec::new();
        for region in &self.regions {
            region.collect_lines(&mut out);
        }
        out
    }

    /// All words, depth first.
    pub fn words(&self) -> Vec<&Word> {
        self.lines()
            .into_iter()
            .flat_map(|line| line.words.iter())
            .collect()
    }

    /// Every element identifier on the page, depth first.
    pub fn element_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for region in &self.regions {
            region.collect_ids(&mut ids);
        }
        if let Some(ref order) = self.reading_order {
            ids.push(order.id.as_str());
            for entry in &order.entries {
                if let OrderEntry::Group { id, .. } = entry {
                    ids.push(id.as_str());
                }
            }
        }
        ids
    }

    /// Get plain text content of the page.
    pub fn plain_text(&self) -> String {
        self.lines()
            .iter()
            .filter_map(|line| line.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `ReadingOrder/OrderedGroup` of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingOrder {
    /// Group identifier
    pub id: String,

    /// Group comments
    pub comments: Option<String>,

    /// Indexed entries
    pub entries: Vec<OrderEntry>,
}

impl ReadingOrder {
    /// Create an empty ordered group.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comments: None,
            entries: Vec::new(),
        }
    }

    /// Set comments.
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// Append a region reference at the next index.
    pub fn push_region(&mut self, region_ref: impl Into<String>) {
        let index = self.entries.len() as u32;
        self.entries.push(OrderEntry::Region {
            index,
            region_ref: region_ref.into(),
        });
    }

    /// Append an unordered group at the next index.
    pub fn push_group(
        &mut self,
        id: impl Into<String>,
        comments: impl Into<String>,
        region_refs: Vec<String>,
    ) {
        let index = self.entries.len() as u32;
        self.entries.push(OrderEntry::Group {
            index,
            id: id.into(),
            comments: Some(comments.into()),
            region_refs,
        });
    }

    /// Check if the group has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One indexed entry of the ordered group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEntry {
    /// `RegionRefIndexed`
    Region {
        /// Position in the group
        index: u32,
        /// Referenced region id
        region_ref: String,
    },

    /// `UnorderedGroupIndexed` holding one `RegionRef` per member
    Group {
        /// Position in the group
        index: u32,
        /// Group identifier
        id: String,
        /// Group comments
        comments: Option<String>,
        /// Referenced region ids
        region_refs: Vec<String>,
    },
}

impl OrderEntry {
    /// Position in the group.
    pub fn index(&self) -> u32 {
        match self {
            OrderEntry::Region { index, .. } | OrderEntry::Group { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::model::{Region, TextEquiv};

    #[test]
    fn test_page_new() {
        let page = Page::new("scan.png", 1000, 2000);
        assert_eq!(page.image_width, 1000);
        assert!(page.is_empty());
        assert!(page.reading_order.is_none());
    }

    #[test]
    fn test_reading_order_indices() {
        let mut order = ReadingOrder::new("ro");
        order.push_region("r1");
        order.push_group("g", "table", vec!["c1".into(), "c2".into()]);
        order.push_region("r2");
        let indices: Vec<_> = order.entries.iter().map(OrderEntry::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_plain_text_and_ids() {
        let coords = Polygon::rectangle(0, 0, 10, 10);
        let mut line = TextLine::new("line-1", coords.clone());
        line.text_equiv = Some(TextEquiv::new("Hello", None));
        let mut region = Region::text("r-1", coords);
        region.lines.push(line);

        let mut page = Page::new("a.png", 10, 10);
        page.add_region(region);

        assert_eq!(page.plain_text(), "Hello");
        assert_eq!(page.element_ids(), vec!["r-1", "line-1"]);
        assert_eq!(page.lines().len(), 1);
        assert!(page.words().is_empty());
    }
}
