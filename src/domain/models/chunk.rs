//! Chunk model: the unit of work handed to the code-generation agent.

use serde::{Deserialize, Serialize};

use super::ranges::{ranges_text, LineRange};
use super::region::Region;

/// One region paired with every missing-line range assigned to it.
///
/// Invariant: `ranges` is non-empty, and every range is fully contained in
/// some originally-reported missing range. Chunks partition the coalesced
/// missing-line set: no line is dropped or duplicated across chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The region the ranges were assigned to.
    pub region: Region,
    /// Missing-line ranges inside (or, for the module fallback, straddling)
    /// the region, in ascending order.
    pub ranges: Vec<LineRange>,
}

impl Chunk {
    pub fn new(region: Region, ranges: Vec<LineRange>) -> Self {
        debug_assert!(!ranges.is_empty(), "Chunk must carry at least one range");
        Self { region, ranges }
    }

    /// Textual form of the ranges for prompts and status lines.
    pub fn ranges_text(&self) -> String {
        ranges_text(&self.ranges)
    }

    /// Total number of missing lines in this chunk.
    pub fn line_count(&self) -> u32 {
        self.ranges.iter().map(LineRange::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::region::RegionKind;

    #[test]
    fn test_chunk_text_and_count() {
        let chunk = Chunk::new(
            Region::new("parse", RegionKind::Function, 10, 20),
            vec![LineRange::new(11, 13), LineRange::new(17, 17)],
        );
        assert_eq!(chunk.ranges_text(), "11-13, 17-17");
        assert_eq!(chunk.line_count(), 4);
    }
}
