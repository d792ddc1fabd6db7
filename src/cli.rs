//! CLI argument parsing for `ctint`.
//!
//! The CLI is intentionally thin: every command loads the workspace config,
//! calls one library entry point, and prints the result as text or JSON.
use clap::{Parser, Subcommand};
use contract_integrity::fix::FixStrategy;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "ctint",
    version,
    about = "Referential integrity checks and implementation resolution for contract specs",
    after_help = "Commands:\n  init --root <dir>                   Write a default contracts.config.json\n  check --root <dir>                  Validate references, orphans, and test coverage\n  impls --root <dir> [--spec <file>]  Resolve implementation files for specs\n  fix --root <dir>                    Apply fixes for dangling references\n\nExamples:\n  ctint init --root .\n  ctint check --root . --json\n  ctint check --root . --feature billing\n  ctint impls --root . --spec contracts/billing.command.ts\n  ctint fix --root . --strategy implement-skeleton --dry-run",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log filter (trace, debug, info, warn, error); RUST_LOG is used when unset
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Check(CheckArgs),
    Impls(ImplsArgs),
    Fix(FixArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write a default contracts.config.json")]
pub struct InitArgs {
    /// Workspace root
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Validate feature references, orphans, and test coverage")]
pub struct CheckArgs {
    /// Workspace root
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Only validate references of this feature
    #[arg(long, value_name = "KEY")]
    pub feature: Option<String>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Resolve implementation files for specs")]
pub struct ImplsArgs {
    /// Workspace root
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Resolve only the first spec declared in this file
    #[arg(long, value_name = "PATH")]
    pub spec: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Fix unresolved references and broken links")]
pub struct FixArgs {
    /// Workspace root
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Only fix issues raised for this feature
    #[arg(long, value_name = "KEY")]
    pub feature: Option<String>,

    /// Strategy to force: remove-reference, implement-skeleton, implement-ai
    #[arg(long, value_name = "STRATEGY", value_parser = parse_strategy)]
    pub strategy: Option<FixStrategy>,

    /// Prefer implement-ai where it is offered
    #[arg(long)]
    pub prefer_ai: bool,

    /// Report intended changes without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

fn parse_strategy(raw: &str) -> Result<FixStrategy, String> {
    FixStrategy::parse(raw).ok_or_else(|| {
        format!("unknown strategy {raw:?} (expected remove-reference, implement-skeleton, or implement-ai)")
    })
}
