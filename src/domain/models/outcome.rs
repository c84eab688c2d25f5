//! Run outcome models.
//!
//! The convergence loop never aborts a whole run over a single file; it
//! records a terminal outcome per plan entry and moves on. The run report
//! aggregates those outcomes and decides the process exit status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal state of one plan entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryStatus {
    /// The file's gap is empty.
    Converged {
        /// Percent covered at convergence, when the report carried one.
        percent: Option<f64>,
    },

    /// The same gap signature was attempted beyond the retry bound.
    Stalled {
        /// Canonical signature of the gap that stopped moving.
        signature: String,
        /// How many generation requests were spent on that signature.
        attempts: u32,
        /// The missing lines behind the signature, for the final report.
        last_missing: Vec<u32>,
    },

    /// The measurement ran but its report artifact was missing or malformed,
    /// so the remaining gap cannot be determined.
    ReportUnreadable {
        reason: String,
        last_missing: Vec<u32>,
    },

    /// Any other per-entry failure (outline extraction, agent transport).
    Failed { reason: String },
}

impl EntryStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Outcome of processing one plan entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryOutcome {
    /// Repo-relative production file path.
    pub prod_rel: String,
    /// Terminal state.
    pub status: EntryStatus,
    /// Generation requests issued for this entry, remediation prompts
    /// excluded.
    pub generation_requests: u32,
    /// When processing of the entry finished.
    pub finished_at: DateTime<Utc>,
}

/// Aggregated report for one `generate` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<EntryOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: EntryOutcome) {
        self.outcomes.push(outcome);
    }

    /// True when every entry reached `Converged`; drives the exit status.
    pub fn all_converged(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_converged())
    }

    /// Entries that did not converge, for the final enumeration.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_converged())
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
