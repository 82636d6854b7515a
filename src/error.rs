//! Error types for textract2page library.

use std::io;
use thiserror::Error;

/// Result type alias for textract2page operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a Textract response.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The block collection could not be parsed, or a block lacks a required field.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Two blocks share the same identifier.
    #[error("Duplicate block identifier: {0}")]
    DuplicateIdentifier(String),

    /// No PAGE block was found.
    #[error("No PAGE block found in input")]
    MissingRoot,

    /// More than one PAGE block was found.
    #[error("Expected exactly one PAGE block, found {count} ({first}, {second}, ...)")]
    MultipleRoots {
        /// Number of PAGE blocks
        count: usize,
        /// Identifier of the first PAGE block
        first: String,
        /// Identifier of the second PAGE block
        second: String,
    },

    /// A CHILD relationship points at an identifier that does not exist.
    #[error("Block {parent} references unknown child {child}")]
    DanglingReference {
        /// Referencing block
        parent: String,
        /// Missing identifier
        child: String,
    },

    /// CHILD relationships form a cycle.
    #[error("Cycle detected: block {parent} lists its ancestor {child} as a child")]
    CycleDetected {
        /// Block carrying the back edge
        parent: String,
        /// Ancestor referenced again
        child: String,
    },

    /// A block is listed as a child of two different parents.
    #[error("Block {child} is a child of both {first_parent} and {second_parent}")]
    SharedChild {
        /// Shared block
        child: String,
        /// Parent that claimed it first
        first_parent: String,
        /// Parent that claimed it again
        second_parent: String,
    },

    /// Blocks exist that cannot be reached from the PAGE block.
    #[error("{count} block(s) not reachable from the PAGE block (first: {first})")]
    Unreachable {
        /// Number of unreachable blocks
        count: usize,
        /// Identifier of the first unreachable block
        first: String,
    },

    /// Geometry cannot be turned into a valid polygon.
    #[error("Degenerate geometry on block {id}: {reason}")]
    DegenerateGeometry {
        /// Offending block
        id: String,
        /// What is wrong with it
        reason: String,
    },

    /// The assembled document cannot satisfy the PAGE-XML schema.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Error reading image dimensions.
    #[error("Image error: {0}")]
    Image(String),

    /// Error during rendering (XML, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Offending block identifier, when the error is tied to one.
    pub fn block_id(&self) -> Option<&str> {
        match self {
            Error::DuplicateIdentifier(id) => Some(id),
            Error::DanglingReference { parent, .. } => Some(parent),
            Error::CycleDetected { parent, .. } => Some(parent),
            Error::SharedChild { child, .. } => Some(child),
            Error::Unreachable { first, .. } => Some(first),
            Error::DegenerateGeometry { id, .. } => Some(id),
            Error::MultipleRoots { second, .. } => Some(second),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.into())
        } else {
            Error::MalformedInput(err.to_string())
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::Image(err.to_string()),
        }
    }
}
