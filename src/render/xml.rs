//! PAGE-XML serialization.
//!
//! Elements are written in the order the schema's sequences require:
//! `Coords` first, then roles, nested regions, lines and finally
//! `TextEquiv`.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Error, Result};
use crate::geometry::Polygon;
use crate::model::{
    Metadata, OrderEntry, Page, PcGts, ReadingOrder, Region, RegionKind, TableCellRole, TextEquiv,
    TextLine, Word,
};

use super::options::{RenderOptions, PAGE_NAMESPACE, PAGE_SCHEMA_LOCATION};

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Serialize a document to a PAGE-XML string.
pub fn to_xml(doc: &PcGts, options: &RenderOptions) -> Result<String> {
    let bytes = to_xml_bytes(doc, options)?;
    String::from_utf8(bytes).map_err(|e| Error::Render(format!("invalid UTF-8 output: {}", e)))
}

/// Serialize a document to UTF-8 PAGE-XML bytes.
pub fn to_xml_bytes(doc: &PcGts, options: &RenderOptions) -> Result<Vec<u8>> {
    let writer = if options.indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', options.indent)
    } else {
        Writer::new(Vec::new())
    };
    let mut xml = XmlWriter { writer };
    xml.document(doc, options)?;

    let mut out = xml.writer.into_inner();
    out.push(b'\n');
    Ok(out)
}

struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event)?;
        Ok(())
    }

    fn start(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.event(Event::Empty(element))
    }

    /// `<name>text</name>`
    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(BytesStart::new(name))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn document(&mut self, doc: &PcGts, options: &RenderOptions) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("pc:PcGts");
        root.push_attribute(("xmlns:pc", PAGE_NAMESPACE));
        if options.schema_location {
            root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
            let location = format!("{} {}", PAGE_NAMESPACE, PAGE_SCHEMA_LOCATION);
            root.push_attribute(("xsi:schemaLocation", location.as_str()));
        }
        self.start(root)?;
        self.metadata(&doc.metadata)?;
        self.page(&doc.page)?;
        self.end("pc:PcGts")
    }

    fn metadata(&mut self, metadata: &Metadata) -> Result<()> {
        self.start(BytesStart::new("pc:Metadata"))?;
        self.text_element("pc:Creator", &metadata.creator)?;
        self.text_element("pc:Created", &timestamp(&metadata.created))?;
        self.text_element("pc:LastChange", &timestamp(&metadata.last_change))?;
        if let Some(ref comments) = metadata.comments {
            self.text_element("pc:Comments", comments)?;
        }
        self.end("pc:Metadata")
    }

    fn page(&mut self, page: &Page) -> Result<()> {
        let mut element = BytesStart::new("pc:Page");
        element.push_attribute(("imageFilename", page.image_filename.as_str()));
        element.push_attribute(("imageWidth", page.image_width.to_string().as_str()));
        element.push_attribute(("imageHeight", page.image_height.to_string().as_str()));

        if page.reading_order.is_none() && page.regions.is_empty() {
            return self.empty(element);
        }

        self.start(element)?;
        if let Some(ref order) = page.reading_order {
            self.reading_order(order)?;
        }
        for region in &page.regions {
            self.region(region)?;
        }
        self.end("pc:Page")
    }

    fn reading_order(&mut self, order: &ReadingOrder) -> Result<()> {
        self.start(BytesStart::new("pc:ReadingOrder"))?;

        let mut group = BytesStart::new("pc:OrderedGroup");
        group.push_attribute(("id", order.id.as_str()));
        if let Some(ref comments) = order.comments {
            group.push_attribute(("comments", comments.as_str()));
        }
        self.start(group)?;

        for entry in &order.entries {
            match entry {
                OrderEntry::Region { index, region_ref } => {
                    let mut element = BytesStart::new("pc:RegionRefIndexed");
                    element.push_attribute(("index", index.to_string().as_str()));
                    element.push_attribute(("regionRef", region_ref.as_str()));
                    self.empty(element)?;
                }
                OrderEntry::Group {
                    index,
                    id,
                    comments,
                    region_refs,
                } => {
                    let mut element = BytesStart::new("pc:UnorderedGroupIndexed");
                    element.push_attribute(("id", id.as_str()));
                    element.push_attribute(("index", index.to_string().as_str()));
                    if let Some(comments) = comments {
                        element.push_attribute(("comments", comments.as_str()));
                    }
                    self.start(element)?;
                    for region_ref in region_refs {
                        let mut r = BytesStart::new("pc:RegionRef");
                        r.push_attribute(("regionRef", region_ref.as_str()));
                        self.empty(r)?;
                    }
                    self.end("pc:UnorderedGroupIndexed")?;
                }
            }
        }

        self.end("pc:OrderedGroup")?;
        self.end("pc:ReadingOrder")
    }

    fn region(&mut self, region: &Region) -> Result<()> {
        let name = format!("pc:{}", region.element_name());
        let mut element = BytesStart::new(name.as_str());
        element.push_attribute(("id", region.id.as_str()));
        if let Some(ref custom) = region.custom {
            element.push_attribute(("custom", custom.as_str()));
        }
        match region.kind {
            RegionKind::Text {
                region_type: Some(region_type),
            } => element.push_attribute(("type", region_type.as_str())),
            RegionKind::Table { rows, columns } if rows > 0 && columns > 0 => {
                element.push_attribute(("rows", rows.to_string().as_str()));
                element.push_attribute(("columns", columns.to_string().as_str()));
            }
            _ => {}
        }

        self.start(element)?;
        self.coords(&region.coords)?;
        if let Some(ref role) = region.roles {
            self.roles(role)?;
        }
        for nested in &region.regions {
            self.region(nested)?;
        }
        for line in &region.lines {
            self.line(line)?;
        }
        if let Some(ref text) = region.text_equiv {
            self.text_equiv(text)?;
        }
        self.end(&name)
    }

    fn roles(&mut self, role: &TableCellRole) -> Result<()> {
        self.start(BytesStart::new("pc:Roles"))?;
        let mut element = BytesStart::new("pc:TableCellRole");
        element.push_attribute(("rowIndex", role.row_index.to_string().as_str()));
        element.push_attribute(("columnIndex", role.column_index.to_string().as_str()));
        element.push_attribute(("rowSpan", role.row_span.to_string().as_str()));
        element.push_attribute(("colSpan", role.col_span.to_string().as_str()));
        if role.header {
            element.push_attribute(("header", "true"));
        }
        self.empty(element)?;
        self.end("pc:Roles")
    }

    fn line(&mut self, line: &TextLine) -> Result<()> {
        let mut element = BytesStart::new("pc:TextLine");
        element.push_attribute(("id", line.id.as_str()));
        self.start(element)?;
        self.coords(&line.coords)?;
        for word in &line.words {
            self.word(word)?;
        }
        if let Some(ref text) = line.text_equiv {
            self.text_equiv(text)?;
        }
        self.end("pc:TextLine")
    }

    fn word(&mut self, word: &Word) -> Result<()> {
        let mut element = BytesStart::new("pc:Word");
        element.push_attribute(("id", word.id.as_str()));
        if let Some(production) = word.production {
            element.push_attribute(("production", production.as_str()));
        }
        self.start(element)?;
        self.coords(&word.coords)?;
        if let Some(ref text) = word.text_equiv {
            self.text_equiv(text)?;
        }
        self.end("pc:Word")
    }

    fn coords(&mut self, coords: &Polygon) -> Result<()> {
        let mut element = BytesStart::new("pc:Coords");
        element.push_attribute(("points", coords.to_points_string().as_str()));
        self.empty(element)
    }

    fn text_equiv(&mut self, text: &TextEquiv) -> Result<()> {
        let mut element = BytesStart::new("pc:TextEquiv");
        if let Some(conf) = text.conf {
            element.push_attribute(("conf", conf.to_string().as_str()));
        }
        self.start(element)?;
        self.text_element("pc:Unicode", &text.unicode)?;
        self.end("pc:TextEquiv")
    }
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextRegionType, Production};
    use quick_xml::Reader;

    fn sample() -> PcGts {
        let coords = Polygon::rectangle(100, 200, 300, 300);
        let mut word = crate::model::Word::new("word-w1", coords.clone());
        word.production = Some(Production::Printed);
        word.text_equiv = Some(TextEquiv::new("Hello", Some(0.98)));

        let mut line = TextLine::new("line-l1", coords.clone());
        line.text_equiv = Some(TextEquiv::new("Hello", Some(0.99)));
        line.words.push(word);

        let mut region = Region::text("line-region-l1", coords).with_type(TextRegionType::Paragraph);
        region.text_equiv = line.text_equiv.clone();
        region.lines.push(line);

        let mut order = ReadingOrder::new("line_reading_order");
        order.push_region("line-region-l1");

        let mut page = Page::new("scan.png", 1000, 2000);
        page.reading_order = Some(order);
        page.add_region(region);
        PcGts::new(Metadata::default(), page)
    }

    /// Element names in document order.
    fn element_names(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut names = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => {
                    names.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap())
                }
                Event::Eof => break,
                _ => {}
            }
        }
        names
    }

    #[test]
    fn test_to_xml_structure() {
        let xml = to_xml(&sample(), &RenderOptions::default()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(PAGE_NAMESPACE));
        assert!(xml.contains("imageWidth=\"1000\""));
        assert!(xml.contains("<pc:Created>1970-01-01T00:00:00Z</pc:Created>"));
        assert!(xml.contains("points=\"100,200 300,200 300,300 100,300\""));
        assert!(xml.contains("<pc:Unicode>Hello</pc:Unicode>"));
        assert!(xml.contains("production=\"printed\""));
        assert!(xml.contains("type=\"paragraph\""));

        let names = element_names(&xml);
        let expected = [
            "pc:PcGts",
            "pc:Metadata",
            "pc:Creator",
            "pc:Created",
            "pc:LastChange",
            "pc:Page",
            "pc:ReadingOrder",
            "pc:OrderedGroup",
            "pc:RegionRefIndexed",
            "pc:TextRegion",
            "pc:Coords",
            "pc:TextLine",
            "pc:Coords",
            "pc:Word",
            "pc:Coords",
            "pc:TextEquiv",
            "pc:Unicode",
            "pc:TextEquiv",
            "pc:Unicode",
            "pc:TextEquiv",
            "pc:Unicode",
        ];
        assert_eq!(names, expected);
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = sample();
        doc.page.regions[0].lines[0].text_equiv = Some(TextEquiv::new("a < b & \"c\"", None));
        let xml = to_xml(&doc, &RenderOptions::default()).unwrap();
        assert!(xml.contains("a &lt; b &amp;"));
        // still well-formed
        element_names(&xml);
    }

    #[test]
    fn test_table_roles_and_group() {
        let coords = Polygon::rectangle(0, 0, 10, 10);
        let mut cell = Region::text("cell-region-c1", coords.clone());
        cell.roles = Some(TableCellRole {
            row_index: 0,
            column_index: 1,
            row_span: 1,
            col_span: 2,
            header: true,
        });
        let mut table = Region::table("table-region-t", coords, 1, 3);
        table.regions.push(cell);

        let mut order = ReadingOrder::new("ro");
        order.push_group(
            "table_t_reading_order",
            "Reading order of this table.",
            vec!["cell-region-c1".into()],
        );
        let mut page = Page::new("a.png", 10, 10);
        page.reading_order = Some(order);
        page.add_region(table);
        let doc = PcGts::new(Metadata::default(), page);

        let xml = to_xml(&doc, &RenderOptions::default()).unwrap();
        assert!(xml.contains("rows=\"1\" columns=\"3\""));
        assert!(xml.contains(
            "<pc:TableCellRole rowIndex=\"0\" columnIndex=\"1\" rowSpan=\"1\" colSpan=\"2\" header=\"true\"/>"
        ));
        assert!(xml.contains("<pc:UnorderedGroupIndexed id=\"table_t_reading_order\" index=\"0\""));
        assert!(xml.contains("<pc:RegionRef regionRef=\"cell-region-c1\"/>"));

        let names = element_names(&xml);
        let table_at = names.iter().position(|n| n == "pc:TableRegion").unwrap();
        assert_eq!(names[table_at + 1], "pc:Coords");
        assert_eq!(names[table_at + 2], "pc:TextRegion");
        assert_eq!(names[table_at + 4], "pc:Roles");
    }

    #[test]
    fn test_empty_page_and_no_indent() {
        let doc = PcGts::new(Metadata::default(), Page::new("a.png", 5, 5));
        let xml = to_xml(&doc, &RenderOptions::new().with_indent(0).with_schema_location(false))
            .unwrap();
        assert!(xml.contains("<pc:Page imageFilename=\"a.png\" imageWidth=\"5\" imageHeight=\"5\"/>"));
        assert!(!xml.contains("xsi:schemaLocation"));
        assert_eq!(xml.lines().count(), 1);
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = to_xml(&sample(), &RenderOptions::default()).unwrap();
        let b = to_xml(&sample(), &RenderOptions::default()).unwrap();
        assert_eq!(a, b);
    }
}
