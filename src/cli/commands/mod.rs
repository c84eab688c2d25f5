//! CLI command implementations.

pub mod context;
pub mod generate;
pub mod init;
pub mod plan;
pub mod scaffold;
