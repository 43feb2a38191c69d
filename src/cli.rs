use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orgsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile GitHub organization variables and secrets with a declared state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Organization to reconcile
    #[arg(long, env = "ORGSYNC_ORG", global = true)]
    pub org: Option<String>,

    /// Directory holding variables.toml, secrets.toml and orgsync.toml
    #[arg(long, env = "ORGSYNC_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change (never writes)
    Diff(TargetArgs),

    /// Create and update declared variables and secrets
    Apply(ApplyArgs),

    /// Delete remote entries that are no longer declared
    Cleanup(CleanupArgs),

    /// Check the declared state without contacting GitHub
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Only these classes (comma-separated): variables, secrets
    #[arg(short, long)]
    pub only: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Dry run - show what would be done
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel writes
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Dry run - list what would be deleted
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Refuse to delete more than this many entries per class
    #[arg(long, env = "ORGSYNC_DELETION_THRESHOLD")]
    pub threshold: Option<usize>,

    /// Number of parallel deletes
    #[arg(short, long)]
    pub jobs: Option<usize>,
}
