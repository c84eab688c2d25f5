//! Domain errors for the covgen convergence engine.

use std::path::PathBuf;
use thiserror::Error;

/// Domain-level errors that can occur while driving a coverage run.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The structural outline extractor failed (missing interpreter, parse
    /// error). Aborts chunk planning for the affected file.
    #[error("Outline unavailable for {path}: {reason}")]
    OutlineUnavailable { path: PathBuf, reason: String },

    /// The measurement collaborator could not be run at all. A test run that
    /// executed but failed is not this error; that surfaces as a non-ok
    /// measurement with stderr attached.
    #[error("Coverage measurement failed: {0}")]
    MeasurementFailed(String),

    /// The report artifact was missing or malformed after a run believed to
    /// have succeeded. Fatal for the current plan entry: the remaining gap
    /// cannot be determined.
    #[error("Coverage report unreadable at {path}: {reason}")]
    ReportUnreadable { path: PathBuf, reason: String },

    /// The same gap signature was attempted beyond the retry bound.
    #[error("Stalled on {file}: gap [{signature}] attempted {attempts} times")]
    Stalled {
        file: String,
        signature: String,
        attempts: u32,
    },

    /// Write attempt outside the designated test directory.
    #[error("Write denied: {0} (only the test directory is writable)")]
    WriteDenied(PathBuf),

    /// Read attempt outside the designated source roots and allow-list.
    #[error("Read denied: {0} (not in coverage roots)")]
    ReadDenied(PathBuf),

    /// The agent process could not be spawned or its transport broke.
    #[error("Agent unavailable: {0}")]
    AgentUnavailable(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
