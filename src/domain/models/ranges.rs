//! Line range models and the interval coalescer.
//!
//! Coverage reports hand back missing lines as a flat list of integers.
//! The planner works on maximal contiguous ranges instead, so the first
//! step of every planning pass is coalescing that list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive, 1-indexed range of source lines.
///
/// Invariant: `start <= end`. Sequences produced by [`coalesce_lines`] are
/// additionally sorted by `start` and neither overlapping nor adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line of the range (1-indexed).
    pub start: u32,
    /// Last line of the range (inclusive).
    pub end: u32,
}

impl LineRange {
    /// Create a new range. Panics in debug builds if `start > end`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "LineRange start must not exceed end");
        Self { start, end }
    }

    /// A range covering a single line.
    pub const fn single(line: u32) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Number of lines covered by this range.
    pub const fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Ranges are never empty; provided for clippy symmetry with `len`.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over every line number in the range.
    pub fn lines(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Coalesce an arbitrary collection of line numbers into the unique minimal
/// sequence of maximal contiguous ranges.
///
/// Duplicates are dropped and input order is irrelevant. The output is sorted
/// ascending by `start`, and no two output ranges overlap or touch. This
/// function is total: there is no error case.
pub fn coalesce_lines(lines: &[u32]) -> Vec<LineRange> {
    let mut sorted: Vec<u32> = lines.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut out = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return out;
    };

    let mut start = first;
    let mut end = first;
    for line in iter {
        if line == end + 1 {
            end = line;
        } else {
            out.push(LineRange::new(start, end));
            start = line;
            end = line;
        }
    }
    out.push(LineRange::new(start, end));
    out
}

/// Render a range sequence the way prompts and status lines expect it:
/// `"11-13, 30-31"`.
pub fn ranges_text(ranges: &[LineRange]) -> String {
    ranges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
