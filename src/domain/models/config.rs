//! Configuration model for covgen.

use serde::{Deserialize, Serialize};

/// Main configuration structure for covgen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Agent client configuration.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Coverage measurement configuration.
    #[serde(default)]
    pub coverage: CoverageConfig,

    /// Convergence loop configuration.
    #[serde(default, rename = "loop")]
    pub run_loop: LoopConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Agent client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Path to the agent CLI binary.
    #[serde(default = "default_agent_binary")]
    pub binary_path: String,

    /// Model to request from the agent CLI, when it accepts one.
    #[serde(default)]
    pub model: Option<String>,

    /// Additional CLI flags appended verbatim.
    #[serde(default)]
    pub extra_flags: Vec<String>,

    /// Poll interval for the output drain, in milliseconds.
    #[serde(default = "default_drain_poll_ms")]
    pub drain_poll_ms: u64,

    /// Consecutive no-growth samples before the buffer counts as drained.
    #[serde(default = "default_drain_stability_checks")]
    pub drain_stability_checks: u32,

    /// Hard drain timeout in milliseconds.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_agent_binary() -> String {
    "copilot".to_string()
}

const fn default_drain_poll_ms() -> u64 {
    250
}

const fn default_drain_stability_checks() -> u32 {
    3
}

const fn default_drain_timeout_ms() -> u64 {
    10_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary_path: default_agent_binary(),
            model: None,
            extra_flags: vec![],
            drain_poll_ms: default_drain_poll_ms(),
            drain_stability_checks: default_drain_stability_checks(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

/// Coverage measurement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoverageConfig {
    /// Python interpreter used for both pytest and the outline script.
    #[serde(default = "default_python_binary")]
    pub python_binary: String,

    /// Repo-relative directory holding generated tests and artifacts.
    #[serde(default = "default_test_dir")]
    pub test_dir: String,

    /// Name of the JSON report artifact written into the test dir.
    #[serde(default = "default_report_name")]
    pub report_name: String,

    /// Source roots used when the target's pyproject declares none.
    #[serde(default = "default_source_roots")]
    pub default_source_roots: Vec<String>,
}

fn default_python_binary() -> String {
    "python".to_string()
}

fn default_test_dir() -> String {
    "test".to_string()
}

fn default_report_name() -> String {
    "coverage.json".to_string()
}

fn default_source_roots() -> Vec<String> {
    vec!["src".to_string()]
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            python_binary: default_python_binary(),
            test_dir: default_test_dir(),
            report_name: default_report_name(),
            default_source_roots: default_source_roots(),
        }
    }
}

/// Convergence loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoopConfig {
    /// Generation requests allowed per identical gap signature before the
    /// entry is declared stalled.
    #[serde(default = "default_max_gap_attempts")]
    pub max_gap_attempts: u32,

    /// Whether to write a JSON diagnostics snapshot on stall.
    #[serde(default = "default_write_diagnostics")]
    pub write_diagnostics: bool,
}

const fn default_max_gap_attempts() -> u32 {
    8
}

const fn default_write_diagnostics() -> bool {
    true
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_gap_attempts: default_max_gap_attempts(),
            write_diagnostics: default_write_diagnostics(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
