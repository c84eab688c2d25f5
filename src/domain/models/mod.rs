//! Domain models: pure data with no collaborator dependencies.

pub mod chunk;
pub mod config;
pub mod coverage;
pub mod outcome;
pub mod plan;
pub mod ranges;
pub mod region;

pub use chunk::Chunk;
pub use config::{AgentConfig, Config, CoverageConfig, LoggingConfig, LoopConfig};
pub use coverage::{CoverageReport, FileCoverage, FileSummary};
pub use outcome::{EntryOutcome, EntryStatus, RunReport};
pub use plan::{PlanEntry, TestPlan};
pub use ranges::{coalesce_lines, ranges_text, LineRange};
pub use region::{Region, RegionKind, MODULE_REGION_NAME};
