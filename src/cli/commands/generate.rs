//! Implementation of the `covgen generate` command: the full pipeline.
//!
//! plan -> scaffold -> repo context -> convergence loop. Exits nonzero when
//! any plan entry fails to converge, so CI can gate on the result.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{EntryStatus, RunReport};
use crate::domain::ports::StatusSink;
use crate::infrastructure::{
    load_coverage_scope, resolve_target_repo, AcpAgentClient, ConfigLoader, FileStatusSink,
    FsPolicy, PyAstOutline, PytestMeasurer,
};
use crate::services::repo_context::gather_repo_context;
use crate::services::{build_test_plan, create_scaffolds, write_test_plan, WriterLoop};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Target Python repository (defaults to COVGEN_TARGET_REPO)
    #[arg(long)]
    pub repo: Option<String>,

    /// Skip the repo-context phase even when no summary exists yet
    #[arg(long)]
    pub skip_context: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct GenerateOutput {
    pub success: bool,
    pub run_id: String,
    pub entries: Vec<EntryLine>,
}

#[derive(Debug, serde::Serialize)]
pub struct EntryLine {
    pub production: String,
    pub state: String,
    pub generation_requests: u32,
}

impl CommandOutput for GenerateOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Run {} {}",
            self.run_id,
            if self.success {
                "converged on every file"
            } else {
                "finished with unconverged files"
            }
        )];
        for entry in &self.entries {
            lines.push(format!(
                "  {}: {} ({} generation request(s))",
                entry.production, entry.state, entry.generation_requests
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: GenerateArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let repo_root = resolve_target_repo(args.repo.as_deref())?;
    let roots = load_coverage_scope(&repo_root, &config.coverage.default_source_roots);
    let test_dir = config.coverage.test_dir.clone();

    let status = FileStatusSink::new(&repo_root, &test_dir);
    status.status(&format!("target repo: {}", repo_root.display()));

    let plan = build_test_plan(&repo_root, &roots, &test_dir)
        .context("Failed to build test plan")?;
    if plan.is_empty() {
        anyhow::bail!("no production files found under roots {roots:?}");
    }
    write_test_plan(&repo_root, &test_dir, &plan).context("Failed to persist test plan")?;
    status.status(&format!("planned {} test file(s)", plan.len()));

    let outline = PyAstOutline::new(config.coverage.python_binary.clone());
    create_scaffolds(&outline, &plan)
        .await
        .context("Failed to create test scaffolds")?;
    status.status("scaffolds ensured");

    let policy = FsPolicy::new(&repo_root, &test_dir, &roots);
    let agent = AcpAgentClient::start(&repo_root, policy, config.agent.clone())
        .await
        .context("Failed to start agent")?;
    let drain_timeout = Duration::from_millis(config.agent.drain_timeout_ms);

    let context_path = repo_root.join(&test_dir).join("_repo_context.md");
    if !args.skip_context && !context_path.exists() {
        status.status("gathering repo context");
        gather_repo_context(&agent, &repo_root, &test_dir, drain_timeout)
            .await
            .context("Failed to gather repo context")?;
    }

    let measurer = PytestMeasurer::new(repo_root.clone(), config.coverage.clone());
    let writer = WriterLoop::new(
        &measurer,
        &outline,
        &agent,
        &status,
        config.run_loop.clone(),
        repo_root.clone(),
        test_dir.clone(),
        drain_timeout,
    );
    let report = writer.run(&plan).await;
    agent.stop().await;

    let success = report.all_converged();
    info!(run_id = %report.run_id, success, "generate finished");
    output(&render(&report, success), json_mode);

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn render(report: &RunReport, success: bool) -> GenerateOutput {
    GenerateOutput {
        success,
        run_id: report.run_id.to_string(),
        entries: report
            .outcomes
            .iter()
            .map(|outcome| EntryLine {
                production: outcome.prod_rel.clone(),
                state: state_text(&outcome.status),
                generation_requests: outcome.generation_requests,
            })
            .collect(),
    }
}

fn state_text(status: &EntryStatus) -> String {
    match status {
        EntryStatus::Converged { percent } => match percent {
            Some(p) => format!("converged, {p:.1}% covered"),
            None => "converged".to_string(),
        },
        EntryStatus::Stalled {
            signature,
            attempts,
            ..
        } => format!("stalled after {attempts} attempts on [{signature}]"),
        EntryStatus::ReportUnreadable { reason, .. } => {
            format!("coverage report unreadable: {reason}")
        }
        EntryStatus::Failed { reason } => format!("failed: {reason}"),
    }
}
