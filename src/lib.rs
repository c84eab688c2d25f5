//! Covgen - agent-driven pytest coverage convergence
//!
//! Covgen points an AI coding agent at a Python repository and drives it,
//! region by region, until the measured coverage gap of every production
//! file is closed or provably stuck.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): line ranges, regions, chunks, coverage
//!   reports, plans, outcomes, and the port traits the loop depends on
//! - **Service Layer** (`services`): gap extraction, chunk planning,
//!   scaffolding, and the convergence loop itself
//! - **Infrastructure Layer** (`infrastructure`): the ACP agent client,
//!   pytest coverage measurement, the Python AST outline, filesystem policy,
//!   and configuration
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use covgen::services::WriterLoop;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire adapters and run the loop over a test plan
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Chunk, Config, CoverageReport, EntryOutcome, EntryStatus, LineRange, PlanEntry, Region,
    RegionKind, RunReport, TestPlan,
};
pub use domain::ports::{AgentClient, CoverageMeasurer, Measurement, OutlineSource, StatusSink};
pub use infrastructure::{ConfigError, ConfigLoader, FsPolicy};
pub use services::{Gap, WriterLoop};
