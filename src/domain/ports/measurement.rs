//! Measurement port - interface for the coverage measurement collaborator.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::CoverageReport;

/// Result of one coverage measurement.
///
/// Coverage is always computed repo-wide, not per-file: the underlying tool
/// re-executes the full test suite. The loop tolerates that cost rather than
/// optimizing around it.
#[derive(Debug, Clone, Default)]
pub struct Measurement {
    /// Whether the test run (and report generation) succeeded. A `false`
    /// here is remediation context for the agent, not a loop-fatal error.
    pub ok: bool,
    /// Captured stdout of the test run.
    pub stdout: String,
    /// Captured stderr of the test run.
    pub stderr: String,
    /// The reduced missing-only summary report, when the measurer produces
    /// one. Preferred by the gap extractor.
    pub summary: Option<CoverageReport>,
    /// The full raw report, when readable. A measurement with neither report
    /// makes the remaining gap undeterminable.
    pub raw: Option<CoverageReport>,
    /// Where the report artifact was expected, for diagnostics when it is
    /// missing or malformed.
    pub report_path: Option<std::path::PathBuf>,
}

impl Measurement {
    /// Whether any report is available to extract a gap from.
    pub fn has_report(&self) -> bool {
        self.summary.is_some() || self.raw.is_some()
    }
}

/// Trait for coverage measurement implementations.
#[async_trait]
pub trait CoverageMeasurer: Send + Sync {
    /// Run the measurement against the whole repository.
    ///
    /// This is a blocking call from the loop's point of view; no operation
    /// is cancellable mid-flight. Errors are reserved for spawn-level
    /// failures; a test run that executed and failed comes back as
    /// `ok == false` with stdout/stderr attached.
    async fn measure(&self) -> DomainResult<Measurement>;
}
