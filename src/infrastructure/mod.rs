//! Infrastructure layer module
//!
//! This module contains all infrastructure adapters and external integrations:
//! - ACP agent client (stdio JSON-RPC)
//! - Pytest coverage measurement
//! - Python AST outline
//! - Filesystem policy enforcement
//! - Configuration management
//! - Status reporting
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod agent;
pub mod config;
pub mod logging;
pub mod outline;
pub mod policy;
pub mod pyproject;
pub mod pytest;
pub mod status;
pub mod target;

pub use agent::AcpAgentClient;
pub use config::{ConfigError, ConfigLoader};
pub use logging::init_tracing;
pub use outline::PyAstOutline;
pub use policy::{FsPolicy, PermissionDecision};
pub use pyproject::load_coverage_scope;
pub use pytest::PytestMeasurer;
pub use status::FileStatusSink;
pub use target::resolve_target_repo;
