//! The test writer loop: per-file coverage convergence.
//!
//! For each plan entry the loop runs measure -> extract -> plan -> generate
//! -> re-measure until the file's gap is empty, bounding repeated attempts
//! on an unchanged gap so an unproductive agent can never spin forever.
//! Entries are processed independently and sequentially; a per-entry failure
//! is recorded in the run report and the loop moves on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Chunk, EntryOutcome, EntryStatus, LoopConfig, PlanEntry, RunReport, TestPlan};
use crate::domain::ports::{AgentClient, CoverageMeasurer, Measurement, OutlineSource, StatusSink};
use crate::services::chunk_planner::{plan_chunks, read_snippet};
use crate::services::gap_extractor::{gap_for, Gap};
use crate::services::scaffold::section_marker;

/// Per-entry loop state: generation attempts keyed by gap signature.
///
/// Keying by the exact missing-line-set signature (rather than by file or by
/// chunk) is intentional: different gaps in the same file each get their own
/// fresh attempt budget. Created when the loop starts an entry, discarded
/// when the entry converges or aborts; never persisted.
#[derive(Debug, Default)]
struct LoopState {
    attempts_for_signature: HashMap<String, u32>,
}

impl LoopState {
    /// Record one more attempt for `signature` and return the new count.
    fn record_attempt(&mut self, signature: &str) -> u32 {
        let count = self
            .attempts_for_signature
            .entry(signature.to_string())
            .or_insert(0);
        *count += 1;
        *count
    }
}

/// Outcome of one entry before it is stamped into the run report.
struct EntryResult {
    status: EntryStatus,
    generation_requests: u32,
}

/// Mutable per-entry bookkeeping shared with the abort path, so a mid-loop
/// failure still reports the requests already spent and the last gap seen.
#[derive(Default)]
struct EntryProgress {
    state: LoopState,
    requests: u32,
    last_lines: Vec<u32>,
}

/// The convergence loop over a test plan.
///
/// Single logical thread of control: every step's correctness depends on
/// observing the coverage effect of the previous step before deciding the
/// next action, so chunks are never processed concurrently.
pub struct WriterLoop<'a> {
    measurer: &'a dyn CoverageMeasurer,
    outline: &'a dyn OutlineSource,
    agent: &'a dyn AgentClient,
    status: &'a dyn StatusSink,
    config: LoopConfig,
    repo_root: PathBuf,
    test_dir: String,
    drain_timeout: Duration,
}

impl<'a> WriterLoop<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        measurer: &'a dyn CoverageMeasurer,
        outline: &'a dyn OutlineSource,
        agent: &'a dyn AgentClient,
        status: &'a dyn StatusSink,
        config: LoopConfig,
        repo_root: impl Into<PathBuf>,
        test_dir: impl Into<String>,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            measurer,
            outline,
            agent,
            status,
            config,
            repo_root: repo_root.into(),
            test_dir: test_dir.into(),
            drain_timeout,
        }
    }

    /// Process every plan entry and aggregate the outcomes.
    pub async fn run(&self, plan: &TestPlan) -> RunReport {
        let mut report = RunReport::new();
        info!(run_id = %report.run_id, entries = plan.len(), "starting writer loop");

        for entry in &plan.entries {
            self.status
                .status(&format!("processing {}", entry.prod_rel));

            let result = self.run_entry(entry).await;

            self.status.status(&format!(
                "{}: {}",
                entry.prod_rel,
                describe_status(&result.status)
            ));
            report.record(EntryOutcome {
                prod_rel: entry.prod_rel.clone(),
                status: result.status,
                generation_requests: result.generation_requests,
                finished_at: Utc::now(),
            });
        }

        report
    }

    /// Drive one entry to a terminal state. Never fails: mid-loop errors are
    /// folded into the result, keeping the request count and last-known gap
    /// already accumulated.
    async fn run_entry(&self, entry: &PlanEntry) -> EntryResult {
        let mut progress = EntryProgress::default();
        let status = match self.drive_entry(entry, &mut progress).await {
            Ok(status) => status,
            Err(err) => {
                warn!(file = %entry.prod_rel, error = %err, "entry aborted");
                entry_status_for_error(err, progress.last_lines.clone())
            }
        };
        EntryResult {
            status,
            generation_requests: progress.requests,
        }
    }

    async fn drive_entry(
        &self,
        entry: &PlanEntry,
        progress: &mut EntryProgress,
    ) -> DomainResult<EntryStatus> {
        let measurement = self.measurer.measure().await?;
        if !measurement.ok {
            // Feed the failure to the agent and keep going; the report may
            // still be readable and the agent may fix the suite.
            self.propose_initial_failure(&measurement).await?;
            let _ = self.agent.drain_output(self.drain_timeout).await;
        }
        let mut gap = self.extract(&measurement, entry)?;
        progress.last_lines = gap.lines.clone();

        'entry: while !gap.is_empty() {
            debug!(file = %entry.prod_rel, missing = gap.lines.len(), "planning chunks");
            let chunks = plan_chunks(self.outline, &entry.prod_abs, &gap.lines).await?;

            for chunk in &chunks {
                // Stall accounting happens against the gap as currently
                // observed, immediately before each generation request.
                let signature = gap.signature();
                let attempts = progress.state.record_attempt(&signature);
                if attempts > self.config.max_gap_attempts {
                    let status = EntryStatus::Stalled {
                        signature: signature.clone(),
                        attempts: attempts - 1,
                        last_missing: gap.lines.clone(),
                    };
                    self.write_diagnostics(entry, &status);
                    return Ok(status);
                }

                let prompt = self.chunk_prompt(entry, chunk).await?;
                self.agent.propose(&prompt).await?;
                progress.requests += 1;
                let _ = self.agent.drain_output(self.drain_timeout).await;

                let rerun = self.measurer.measure().await?;
                if !rerun.ok {
                    // One remediation request, then carry on with the loop.
                    self.propose_fix_failure(entry, &rerun).await?;
                    let _ = self.agent.drain_output(self.drain_timeout).await;
                }

                gap = self.extract(&rerun, entry)?;
                progress.last_lines = gap.lines.clone();
                if gap.is_empty() {
                    // A broad edit may have satisfied the remaining planned
                    // chunks already; do not prompt for them.
                    break 'entry;
                }
            }
        }

        Ok(EntryStatus::Converged {
            percent: gap.percent,
        })
    }

    /// Extract the entry's gap, failing when no report is readable.
    fn extract(&self, measurement: &Measurement, entry: &PlanEntry) -> DomainResult<Gap> {
        if !measurement.has_report() {
            return Err(DomainError::ReportUnreadable {
                path: measurement
                    .report_path
                    .clone()
                    .unwrap_or_else(|| self.repo_root.join(&self.test_dir).join("coverage.json")),
                reason: format!(
                    "no readable report after measurement; stderr:\n{}",
                    measurement.stderr
                ),
            });
        }
        Ok(gap_for(
            measurement.summary.as_ref(),
            measurement.raw.as_ref(),
            &entry.prod_rel,
        ))
    }

    /// Build the generation request for one chunk.
    async fn chunk_prompt(&self, entry: &PlanEntry, chunk: &Chunk) -> DomainResult<String> {
        let region = &chunk.region;
        let snippet = read_snippet(&entry.prod_abs, region.start, region.end).await?;
        let test_rel = self.rel_to_repo(&entry.test_abs);
        let test_dir_abs = self.repo_root.join(&self.test_dir);

        Ok(format!(
            "You are generating pytest tests.\n\
             HARD RULES:\n\
             - You MAY ONLY modify files under: {test_dir}\n\
             - Do NOT modify production code.\n\
             - Goal: cover missing lines in {prod}, region {region}, lines {ranges}.\n\
             - Put new tests under the existing section separator:\n  \"{marker}\"\n\
             \n\
             Production code (region {region}):\n\
             {snippet}\n\
             \n\
             Now write/modify ONLY the test file: {test_rel}\n\
             Make tests deterministic (no network), use monkeypatch for I/O where needed.",
            test_dir = test_dir_abs.display(),
            prod = entry.prod_rel,
            region = region.name,
            ranges = chunk.ranges_text(),
            marker = section_marker(&region.name),
        ))
    }

    /// Remediation request after a failed test run mid-entry.
    async fn propose_fix_failure(
        &self,
        entry: &PlanEntry,
        measurement: &Measurement,
    ) -> DomainResult<()> {
        let test_rel = self.rel_to_repo(&entry.test_abs);
        let prompt = format!(
            "Tests failed. Fix ONLY {test_rel}.\n\
             Pytest stderr:\n{stderr}\n\
             \n\
             Pytest stdout:\n{stdout}",
            stderr = measurement.stderr,
            stdout = measurement.stdout,
        );
        self.agent.propose(&prompt).await
    }

    /// Context request when the very first measurement of an entry fails.
    async fn propose_initial_failure(&self, measurement: &Measurement) -> DomainResult<()> {
        let prompt = format!(
            "Initial pytest run failed for repo. Pytest stderr:\n{}\n\n\
             Proceeding to gather the coverage report if available.",
            measurement.stderr
        );
        self.agent.propose(&prompt).await
    }

    /// Best-effort JSON diagnostics snapshot on stall.
    fn write_diagnostics(&self, entry: &PlanEntry, status: &EntryStatus) {
        if !self.config.write_diagnostics {
            return;
        }
        let EntryStatus::Stalled {
            signature,
            attempts,
            last_missing,
        } = status
        else {
            return;
        };

        let snapshot = json!({
            "file": entry.prod_rel,
            "signature": signature,
            "attempts": attempts,
            "last_missing_lines": last_missing,
            "recorded_at": Utc::now().to_rfc3339(),
        });
        let path = self
            .repo_root
            .join(&self.test_dir)
            .join("_diagnostics.json");
        if let Ok(text) = serde_json::to_string_pretty(&snapshot) {
            if let Err(err) = std::fs::write(&path, text) {
                warn!(path = %path.display(), error = %err, "failed to write diagnostics snapshot");
            }
        }
    }

    fn rel_to_repo(&self, path: &Path) -> String {
        path.strip_prefix(&self.repo_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Map a loop-fatal error onto the entry's terminal status, carrying the
/// last gap observed before the abort.
fn entry_status_for_error(err: DomainError, last_missing: Vec<u32>) -> EntryStatus {
    match err {
        DomainError::ReportUnreadable { path, reason } => EntryStatus::ReportUnreadable {
            reason: format!("{}: {}", path.display(), reason),
            last_missing,
        },
        other => EntryStatus::Failed {
            reason: other.to_string(),
        },
    }
}

fn describe_status(status: &EntryStatus) -> String {
    match status {
        EntryStatus::Converged { percent } => match percent {
            Some(p) => format!("converged ({p:.1}% covered)"),
            None => "converged".to_string(),
        },
        EntryStatus::Stalled {
            signature,
            attempts,
            ..
        } => format!("stalled after {attempts} attempts on gap [{signature}]"),
        EntryStatus::ReportUnreadable { reason, .. } => {
            format!("coverage report unreadable: {reason}")
        }
        EntryStatus::Failed { reason } => format!("failed: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_are_keyed_by_signature() {
        let mut state = LoopState::default();
        assert_eq!(state.record_attempt("1,2,3"), 1);
        assert_eq!(state.record_attempt("1,2,3"), 2);
        // A different gap in the same file gets a fresh budget.
        assert_eq!(state.record_attempt("7"), 1);
        assert_eq!(state.record_attempt("1,2,3"), 3);
    }

    #[test]
    fn test_abort_status_carries_last_gap() {
        let err = DomainError::ReportUnreadable {
            path: PathBuf::from("/repo/test/coverage.json"),
            reason: "empty artifact".to_string(),
        };
        let status = entry_status_for_error(err, vec![4, 5]);
        match status {
            EntryStatus::ReportUnreadable { last_missing, .. } => {
                assert_eq!(last_missing, vec![4, 5]);
            }
            other => panic!("expected report-unreadable, got {other:?}"),
        }
    }

    #[test]
    fn test_describe_status() {
        let status = EntryStatus::Stalled {
            signature: "4,5".to_string(),
            attempts: 8,
            last_missing: vec![4, 5],
        };
        assert_eq!(
            describe_status(&status),
            "stalled after 8 attempts on gap [4,5]"
        );
    }
}
