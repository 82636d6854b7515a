//! PAGE-XML document model.
//!
//! These types mirror the subset of the PRIMA PAGE 2019-07-15 schema the
//! converter emits. The model is built by [`crate::convert`] and written out
//! by [`crate::render`].

mod document;
mod page;
mod region;

pub use document::{Metadata, PcGts};
pub use page::{OrderEntry, Page, ReadingOrder};
pub use region::{
    Production, Region, RegionKind, TableCellRole, TextEquiv, TextLine, TextRegionType, Word,
};
