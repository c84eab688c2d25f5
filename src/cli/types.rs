//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::context::ContextArgs;
use crate::cli::commands::generate::GenerateArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::plan::PlanArgs;
use crate::cli::commands::scaffold::ScaffoldArgs;

#[derive(Parser)]
#[command(name = "covgen")]
#[command(about = "Covgen - agent-driven pytest coverage convergence", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize covgen configuration in the current directory
    Init(InitArgs),

    /// Build and persist the production-to-test file plan
    Plan(PlanArgs),

    /// Create test scaffolds with per-region section markers
    Scaffold(ScaffoldArgs),

    /// Ask the agent for a repo summary and persist it
    Context(ContextArgs),

    /// Run the coverage convergence loop over the test plan
    Generate(GenerateArgs),
}
