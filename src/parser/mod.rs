//! Textract response parsing and block graph resolution.

mod block;
mod graph;
mod options;

pub use block::{
    Block, BlockKind, DocumentMetadata, LayoutKind, Relationship, RelationshipKind,
    TextractResponse,
};
pub use graph::{resolve, BlockGraph, NodeId, ResolvedNode, ResolvedTree};
pub use options::{ErrorMode, ParseOptions};
