//! Implementation of the `covgen init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        if self.success {
            format!("{}\nConfig written to {}", self.message, self.config_path.display())
        } else {
            self.message.clone()
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let covgen_dir = target_path.join(".covgen");
    let config_path = covgen_dir.join("config.yaml");

    if config_path.exists() && !args.force {
        output(
            &InitOutput {
                success: false,
                message: "Already initialized. Use --force to overwrite.".to_string(),
                config_path,
            },
            json_mode,
        );
        return Ok(());
    }

    fs::create_dir_all(&covgen_dir)
        .await
        .with_context(|| format!("Failed to create {}", covgen_dir.display()))?;

    let defaults = serde_yaml::to_string(&Config::default())
        .context("Failed to serialize default configuration")?;
    fs::write(&config_path, defaults)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    output(
        &InitOutput {
            success: true,
            message: if args.force {
                "Reinitialized covgen configuration.".to_string()
            } else {
                "Initialized covgen configuration.".to_string()
            },
            config_path,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };
        execute(args, true).await.unwrap();

        let text = std::fs::read_to_string(dir.path().join(".covgen/config.yaml")).unwrap();
        let config: Config = serde_yaml::from_str(&text).unwrap();
        assert_eq!(config.coverage.test_dir, "test");
        assert_eq!(config.run_loop.max_gap_attempts, 8);
    }

    #[tokio::test]
    async fn test_init_refuses_to_clobber_without_force() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".covgen")).unwrap();
        std::fs::write(dir.path().join(".covgen/config.yaml"), "logging:\n  level: debug\n")
            .unwrap();

        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };
        execute(args, true).await.unwrap();

        let text = std::fs::read_to_string(dir.path().join(".covgen/config.yaml")).unwrap();
        assert!(text.contains("level: debug"));
    }
}
