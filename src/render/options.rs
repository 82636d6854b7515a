//! Rendering options.

/// PAGE 2019-07-15 namespace.
pub const PAGE_NAMESPACE: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15";

/// Location of the PAGE 2019-07-15 schema.
pub const PAGE_SCHEMA_LOCATION: &str =
    "http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15/pagecontent.xsd";

/// Options for writing PAGE-XML.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Spaces per indentation level (0 = single line)
    pub indent: usize,

    /// Emit `xsi:schemaLocation` on the root element
    pub schema_location: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation width.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Enable or disable the schema location hint.
    pub fn with_schema_location(mut self, enabled: bool) -> Self {
        self.schema_location = enabled;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            schema_location: true,
        }
    }
}
