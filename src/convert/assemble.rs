//! Final document assembly and validation.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::geometry::{PageSize, Polygon};
use crate::model::{Metadata, Page, PcGts, Region};

use super::mapper::MappedPage;

/// Wraps mapped regions into a complete [`PcGts`] document.
///
/// The page size is validated on construction so that bad dimensions are
/// reported before any block is mapped.
#[derive(Debug, Clone)]
pub struct Assembler {
    metadata: Metadata,
    image_filename: String,
    size: PageSize,
    reading_order: bool,
}

impl Assembler {
    /// Create an assembler for a page of the given size.
    pub fn new(image_filename: impl Into<String>, size: PageSize, metadata: Metadata) -> Result<Self> {
        if !size.is_valid() {
            return Err(Error::SchemaViolation(format!(
                "page dimensions must be positive, got {}",
                size
            )));
        }
        Ok(Self {
            metadata,
            image_filename: image_filename.into(),
            size,
            reading_order: true,
        })
    }

    /// Emit the reading order (default: on).
    pub fn with_reading_order(mut self, enabled: bool) -> Self {
        self.reading_order = enabled;
        self
    }

    /// Build the document.
    pub fn assemble(self, mapped: MappedPage) -> Result<PcGts> {
        let mut page = Page::new(self.image_filename, self.size.width, self.size.height);
        if self.reading_order && !mapped.reading_order.is_empty() {
            page.reading_order = Some(mapped.reading_order);
        }
        page.regions = mapped.regions;

        validate(&page, self.size)?;
        log::debug!(
            "Assembled page {} with {} regions",
            self.size,
            page.regions.len()
        );
        Ok(PcGts::new(self.metadata, page))
    }
}

/// Check the constraints the serializer relies on.
pub fn validate(page: &Page, size: PageSize) -> Result<()> {
    let mut seen = HashSet::new();
    for id in page.element_ids() {
        if !seen.insert(id) {
            return Err(Error::SchemaViolation(format!("duplicate element id {}", id)));
        }
    }

    for region in &page.regions {
        validate_region(region, size)?;
    }
    Ok(())
}

fn validate_region(region: &Region, size: PageSize) -> Result<()> {
    validate_coords(&region.id, &region.coords, size)?;
    if !region.is_text() && !region.lines.is_empty() {
        return Err(Error::SchemaViolation(format!(
            "{} {} cannot contain text lines",
            region.element_name(),
            region.id
        )));
    }
    for nested in &region.regions {
        validate_region(nested, size)?;
    }
    for line in &region.lines {
        validate_coords(&line.id, &line.coords, size)?;
        for word in &line.words {
            validate_coords(&word.id, &word.coords, size)?;
        }
    }
    Ok(())
}

fn validate_coords(id: &str, coords: &Polygon, size: PageSize) -> Result<()> {
    if coords.len() < 3 {
        return Err(Error::SchemaViolation(format!(
            "{} has {} point(s), need at least 3",
            id,
            coords.len()
        )));
    }
    if let Some((_, max)) = coords.bounds() {
        if max.x > size.width || max.y > size.height {
            return Err(Error::SchemaViolation(format!(
                "{} extends past the {} page",
                id, size
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReadingOrder, TextLine};

    fn mapped(regions: Vec<Region>) -> MappedPage {
        let mut order = ReadingOrder::new("ro");
        for r in &regions {
            order.push_region(r.id.clone());
        }
        MappedPage {
            regions,
            reading_order: order,
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let result = Assembler::new("a.png", PageSize::new(0, 100), Metadata::default());
        assert!(matches!(result, Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_assemble_with_reading_order() {
        let region = Region::text("r1", Polygon::rectangle(0, 0, 10, 10));
        let doc = Assembler::new("a.png", PageSize::new(10, 10), Metadata::default())
            .unwrap()
            .assemble(mapped(vec![region]))
            .unwrap();
        assert_eq!(doc.page.image_filename, "a.png");
        assert_eq!(doc.page.regions.len(), 1);
        assert!(doc.page.reading_order.is_some());
    }

    #[test]
    fn test_reading_order_disabled_or_empty() {
        let region = Region::text("r1", Polygon::rectangle(0, 0, 10, 10));
        let doc = Assembler::new("a.png", PageSize::new(10, 10), Metadata::default())
            .unwrap()
            .with_reading_order(false)
            .assemble(mapped(vec![region]))
            .unwrap();
        assert!(doc.page.reading_order.is_none());

        let empty = Assembler::new("a.png", PageSize::new(10, 10), Metadata::default())
            .unwrap()
            .assemble(mapped(Vec::new()))
            .unwrap();
        assert!(empty.page.reading_order.is_none());
        assert!(empty.page.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let coords = Polygon::rectangle(0, 0, 5, 5);
        let mut region = Region::text("dup", coords.clone());
        region.lines.push(TextLine::new("dup", coords));
        let result = Assembler::new("a.png", PageSize::new(10, 10), Metadata::default())
            .unwrap()
            .assemble(mapped(vec![region]));
        assert!(matches!(result, Err(Error::SchemaViolation(ref m)) if m.contains("dup")));
    }

    #[test]
    fn test_lines_in_table_rejected() {
        let coords = Polygon::rectangle(0, 0, 5, 5);
        let mut table = Region::table("t", coords.clone(), 1, 1);
        table.lines.push(TextLine::new("l", coords));
        let result = validate_region(&table, PageSize::new(10, 10));
        assert!(matches!(result, Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_short_polygon_rejected() {
        let coords = Polygon::new(vec![crate::geometry::Point::new(0, 0)]);
        let result = validate_coords("x", &coords, PageSize::new(10, 10));
        assert!(matches!(result, Err(Error::SchemaViolation(_))));
    }
}
