//! Structural region models.
//!
//! A region is one named structural unit of a source file (function or
//! class), plus the synthetic whole-file `<module>` region used as the
//! assignment fallback. Regions come from the outline extractor and are
//! produced fresh on every query: the agent may edit the file between
//! queries, which invalidates any cached region set.

use serde::{Deserialize, Serialize};

/// Name of the synthetic whole-file region. Chosen so it can never collide
/// with a real Python identifier.
pub const MODULE_REGION_NAME: &str = "<module>";

/// Kind of structural unit a region describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// A function or method body.
    Function,
    /// A class body.
    Class,
    /// The synthetic whole-file fallback region.
    Module,
}

/// A named, contiguous line interval describing one structural unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Name of the unit (`<module>` for the fallback region).
    pub name: String,
    /// What kind of unit this is.
    pub kind: RegionKind,
    /// First line of the unit (1-indexed, inclusive).
    pub start: u32,
    /// Last line of the unit (inclusive).
    pub end: u32,
}

impl Region {
    pub fn new(name: impl Into<String>, kind: RegionKind, start: u32, end: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            start,
            end,
        }
    }

    /// The whole-file fallback region spanning `1..=last_line`.
    pub fn module(last_line: u32) -> Self {
        Self::new(MODULE_REGION_NAME, RegionKind::Module, 1, last_line.max(1))
    }

    /// Whether this is the synthetic whole-file region.
    pub fn is_module(&self) -> bool {
        self.name == MODULE_REGION_NAME
    }

    /// Whether the given range is fully contained in this region.
    ///
    /// Full containment, not mere overlap: a range straddling a region
    /// boundary does not count as contained.
    pub fn contains(&self, start: u32, end: u32) -> bool {
        start >= self.start && end <= self.end
    }
}
