//! Plain text rendering.

use crate::model::PcGts;

/// Text of every line, one per output line, in document order.
pub fn to_text(doc: &PcGts) -> String {
    doc.plain_text()
}
