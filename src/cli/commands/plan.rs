//! Implementation of the `covgen plan` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::{load_coverage_scope, resolve_target_repo, ConfigLoader};
use crate::services::{build_test_plan, write_test_plan};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Target Python repository (defaults to COVGEN_TARGET_REPO)
    #[arg(long)]
    pub repo: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct PlanOutput {
    pub success: bool,
    pub entries: Vec<PlanLine>,
}

#[derive(Debug, serde::Serialize)]
pub struct PlanLine {
    pub production: String,
    pub test: String,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No production files found under the coverage roots.".to_string();
        }
        let mut lines = vec![format!("Planned {} test file(s):", self.entries.len())];
        for entry in &self.entries {
            lines.push(format!("  {} -> {}", entry.production, entry.test));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: PlanArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let repo_root = resolve_target_repo(args.repo.as_deref())?;
    let roots = load_coverage_scope(&repo_root, &config.coverage.default_source_roots);

    let plan = build_test_plan(&repo_root, &roots, &config.coverage.test_dir)
        .context("Failed to build test plan")?;
    write_test_plan(&repo_root, &config.coverage.test_dir, &plan)
        .context("Failed to persist test plan")?;

    output(
        &PlanOutput {
            success: true,
            entries: plan
                .entries
                .iter()
                .map(|e| PlanLine {
                    production: e.prod_rel.clone(),
                    test: e.test_abs.display().to_string(),
                })
                .collect(),
        },
        json_mode,
    );
    Ok(())
}
