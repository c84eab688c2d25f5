use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Agent binary path cannot be empty")]
    EmptyAgentBinary,

    #[error("Python binary cannot be empty")]
    EmptyPythonBinary,

    #[error("Test directory cannot be empty")]
    EmptyTestDir,

    #[error("Invalid max_gap_attempts: {0}. Must be at least 1")]
    InvalidMaxGapAttempts(u32),

    #[error("Invalid drain_stability_checks: {0}. Must be at least 1")]
    InvalidStabilityChecks(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .covgen/config.yaml (project config, created by init)
    /// 3. .covgen/local.yaml (project local overrides, optional)
    /// 4. Environment variables (COVGEN_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".covgen/config.yaml"))
            .merge(Yaml::file(".covgen/local.yaml"))
            .merge(Env::prefixed("COVGEN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.agent.binary_path.trim().is_empty() {
            return Err(ConfigError::EmptyAgentBinary);
        }
        if config.agent.drain_stability_checks == 0 {
            return Err(ConfigError::InvalidStabilityChecks(
                config.agent.drain_stability_checks,
            ));
        }

        if config.coverage.python_binary.trim().is_empty() {
            return Err(ConfigError::EmptyPythonBinary);
        }
        if config.coverage.test_dir.trim().is_empty() {
            return Err(ConfigError::EmptyTestDir);
        }

        if config.run_loop.max_gap_attempts == 0 {
            return Err(ConfigError::InvalidMaxGapAttempts(
                config.run_loop.max_gap_attempts,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
