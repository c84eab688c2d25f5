//! Coverage gap extraction.
//!
//! Turns a coverage measurement into the gap for one file: the missing
//! lines, missing branches, and percent covered. Absence of coverage data
//! for a file is "nothing observed", not an error - a freshly added file may
//! not appear in a report yet.

use serde_json::Value;

use crate::domain::models::CoverageReport;

/// The gap a measurement reports for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gap {
    /// Missing line numbers, sorted ascending and deduplicated.
    pub lines: Vec<u32>,
    /// Missing branch arcs in the report's native form.
    pub branches: Vec<Value>,
    /// Percent covered, when the report carried a summary.
    pub percent: Option<f64>,
}

impl Gap {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Canonical signature of the missing-line set: sorted line numbers
    /// joined by commas. Used as the stall-counter key, so two measurements
    /// of the same gap must always produce the same signature.
    pub fn signature(&self) -> String {
        self.lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Extract the gap for `rel_path`, preferring the reduced summary report and
/// falling back to the raw report only when the summary omits the file.
///
/// Lookups tolerate `/` vs `\` path separators (see
/// [`CoverageReport::file`]). A file absent from every report yields an
/// empty gap.
pub fn gap_for(
    summary: Option<&CoverageReport>,
    raw: Option<&CoverageReport>,
    rel_path: &str,
) -> Gap {
    let entry = summary
        .and_then(|report| report.file(rel_path))
        .or_else(|| raw.and_then(|report| report.file(rel_path)));

    let Some(entry) = entry else {
        return Gap::default();
    };

    let mut lines = entry.missing_lines.clone();
    lines.sort_unstable();
    lines.dedup();

    Gap {
        lines,
        branches: entry.missing_branches.clone(),
        percent: entry.summary.as_ref().and_then(|s| s.percent_covered),
    }
}
