//! Coverage report model.
//!
//! Mirrors the shape of a `coverage.py` JSON report (`coverage json`), keyed
//! by repo-relative file path. Only the fields the convergence engine depends
//! on are modeled; everything else in the artifact is ignored on parse.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-file summary block of a coverage report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSummary {
    /// Percent of statements covered, 0.0..=100.0.
    #[serde(default)]
    pub percent_covered: Option<f64>,
}

/// Coverage data for a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileCoverage {
    /// Line numbers not executed by the test run.
    #[serde(default)]
    pub missing_lines: Vec<u32>,

    /// Branch arcs not taken, in the report's native form. The engine never
    /// interprets these; they are carried through for prompts and diagnostics.
    #[serde(default)]
    pub missing_branches: Vec<serde_json::Value>,

    /// Summary block, when the report carries one.
    #[serde(default)]
    pub summary: Option<FileSummary>,
}

/// A parsed coverage report.
///
/// Works for both the full raw report and the reduced missing-only summary
/// artifact: the summary simply omits fields this model defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Per-file coverage, keyed by repo-relative path.
    #[serde(default)]
    pub files: HashMap<String, FileCoverage>,
}

impl CoverageReport {
    /// Parse a report from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Look up a file, tolerating `/` vs `\` path separators.
    ///
    /// Reports generated on Windows may key paths with backslashes while the
    /// caller holds a POSIX-form relative path (or vice versa); both forms
    /// are tried before giving up.
    pub fn file(&self, rel_path: &str) -> Option<&FileCoverage> {
        if let Some(entry) = self.files.get(rel_path) {
            return Some(entry);
        }
        let forward = rel_path.replace('\\', "/");
        if let Some(entry) = self.files.get(&forward) {
            return Some(entry);
        }
        let backward = rel_path.replace('/', "\\");
        self.files.get(&backward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(key: &str) -> CoverageReport {
        let mut files = HashMap::new();
        files.insert(
            key.to_string(),
            FileCoverage {
                missing_lines: vec![4, 5],
                ..Default::default()
            },
        );
        CoverageReport { files }
    }

    #[test]
    fn test_parse_coverage_json() {
        let text = r#"{
            "files": {
                "src/pkg/mod.py": {
                    "missing_lines": [2, 3, 9],
                    "missing_branches": [[4, 5]],
                    "summary": {"percent_covered": 83.3}
                }
            },
            "totals": {"percent_covered": 83.3}
        }"#;
        let report = CoverageReport::from_json(text).unwrap();
        let entry = report.file("src/pkg/mod.py").unwrap();
        assert_eq!(entry.missing_lines, vec![2, 3, 9]);
        assert_eq!(entry.missing_branches.len(), 1);
        assert_eq!(entry.summary.as_ref().unwrap().percent_covered, Some(83.3));
    }

    #[test]
    fn test_lookup_tolerates_separators() {
        let report = report_with("pkg/mod.py");
        assert!(report.file("pkg/mod.py").is_some());
        assert!(report.file("pkg\\mod.py").is_some());

        let report = report_with("pkg\\mod.py");
        assert!(report.file("pkg/mod.py").is_some());
    }

    #[test]
    fn test_lookup_missing_file() {
        let report = report_with("pkg/mod.py");
        assert!(report.file("pkg/other.py").is_none());
    }
}
