//! Domain ports: interfaces to the external collaborators.

pub mod agent;
pub mod measurement;
pub mod outline;
pub mod status;

pub use agent::AgentClient;
pub use measurement::{CoverageMeasurer, Measurement};
pub use outline::OutlineSource;
pub use status::{NullStatusSink, StatusSink};
