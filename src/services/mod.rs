//! Service layer: the algorithmic core of the convergence engine.

pub mod chunk_planner;
pub mod gap_extractor;
pub mod repo_context;
pub mod scaffold;
pub mod test_planner;
pub mod writer_loop;

pub use chunk_planner::{plan_chunks, read_snippet};
pub use gap_extractor::{gap_for, Gap};
pub use scaffold::{create_scaffolds, section_marker};
pub use test_planner::{build_test_plan, read_test_plan, write_test_plan};
pub use writer_loop::WriterLoop;
