//! Document-level types.

use super::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// PAGE-XML document root (`PcGts`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcGts {
    /// Provenance metadata
    pub metadata: Metadata,

    /// The single page
    pub page: Page,
}

impl PcGts {
    /// Create a new document.
    pub fn new(metadata: Metadata, page: Page) -> Self {
        Self { metadata, page }
    }

    /// Get plain text content of the page, one line per text line.
    pub fn plain_text(&self) -> String {
        self.page.plain_text()
    }
}

/// Document metadata.
///
/// PAGE requires `Creator`, `Created` and `LastChange`; nothing else is
/// tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Creator application
    pub creator: String,

    /// Creation date
    pub created: DateTime<Utc>,

    /// Last modification date
    pub last_change: DateTime<Utc>,

    /// Free-form comments
    pub comments: Option<String>,
}

impl Metadata {
    /// Create metadata stamped with a single timestamp.
    pub fn new(creator: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            creator: creator.into(),
            created: timestamp,
            last_change: timestamp,
            comments: None,
        }
    }

    /// Creator string of this library, e.g. `textract2page 0.3.0`.
    pub fn default_creator() -> String {
        format!("textract2page {}", env!("CARGO_PKG_VERSION"))
    }

    /// Set comments.
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new(Self::default_creator(), DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_default_is_deterministic() {
        let a = Metadata::default();
        let b = Metadata::default();
        assert_eq!(a, b);
        assert_eq!(a.created.timestamp(), 0);
        assert!(a.creator.starts_with("textract2page "));
    }

    #[test]
    fn test_metadata_single_timestamp() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let metadata = Metadata::new("tester", ts).with_comments("converted");
        assert_eq!(metadata.created, metadata.last_change);
        assert_eq!(metadata.comments.as_deref(), Some("converted"));
    }
}
