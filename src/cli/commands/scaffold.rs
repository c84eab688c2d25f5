//! Implementation of the `covgen scaffold` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::{resolve_target_repo, ConfigLoader, PyAstOutline};
use crate::services::{create_scaffolds, read_test_plan};

#[derive(Args, Debug)]
pub struct ScaffoldArgs {
    /// Target Python repository (defaults to COVGEN_TARGET_REPO)
    #[arg(long)]
    pub repo: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ScaffoldOutput {
    pub success: bool,
    pub entries: usize,
}

impl CommandOutput for ScaffoldOutput {
    fn to_human(&self) -> String {
        format!("Scaffolds ensured for {} plan entr(y/ies).", self.entries)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ScaffoldArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let repo_root = resolve_target_repo(args.repo.as_deref())?;

    let plan = read_test_plan(&repo_root, &config.coverage.test_dir)
        .context("No test plan found; run `covgen plan` first")?;

    let outline = PyAstOutline::new(config.coverage.python_binary.clone());
    create_scaffolds(&outline, &plan)
        .await
        .context("Failed to create test scaffolds")?;

    output(
        &ScaffoldOutput {
            success: true,
            entries: plan.len(),
        },
        json_mode,
    );
    Ok(())
}
