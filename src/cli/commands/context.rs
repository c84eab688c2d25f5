//! Implementation of the `covgen context` command.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::{
    load_coverage_scope, resolve_target_repo, AcpAgentClient, ConfigLoader, FsPolicy,
};
use crate::services::repo_context::gather_repo_context;

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Target Python repository (defaults to COVGEN_TARGET_REPO)
    #[arg(long)]
    pub repo: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ContextOutput {
    pub success: bool,
    pub context_path: String,
}

impl CommandOutput for ContextOutput {
    fn to_human(&self) -> String {
        format!("Repo context written to {}", self.context_path)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ContextArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let repo_root = resolve_target_repo(args.repo.as_deref())?;
    let roots = load_coverage_scope(&repo_root, &config.coverage.default_source_roots);

    let policy = FsPolicy::new(&repo_root, &config.coverage.test_dir, &roots);
    let agent = AcpAgentClient::start(&repo_root, policy, config.agent.clone())
        .await
        .context("Failed to start agent")?;

    let drain_timeout = Duration::from_millis(config.agent.drain_timeout_ms);
    let result = gather_repo_context(&agent, &repo_root, &config.coverage.test_dir, drain_timeout)
        .await
        .context("Failed to gather repo context");
    agent.stop().await;
    result?;

    output(
        &ContextOutput {
            success: true,
            context_path: repo_root
                .join(&config.coverage.test_dir)
                .join("_repo_context.md")
                .display()
                .to_string(),
        },
        json_mode,
    );
    Ok(())
}
