mod cli;
mod commands;
mod config;
mod output;
mod paths;
mod progress;
mod store;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, OutputFormat};
use config::ConfigError;
use declarative::RunOutcome;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status for fatal configuration errors
const EXIT_CONFIG: u8 = 3;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub format: OutputFormat,
    pub org: Option<String>,
    pub config_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        format: cli.format,
        org: cli.org,
        config_dir: cli.config_dir,
    };

    let result = match &cli.command {
        Command::Diff(args) => commands::sync::diff(&ctx, args),
        Command::Apply(args) => commands::sync::apply(&ctx, args),
        Command::Cleanup(args) => commands::cleanup::run(&ctx, args),
        Command::Validate => commands::validate::run(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "orgsync", &mut io::stdout());
            Ok(RunOutcome::Success)
        }
    };

    match result {
        Ok(outcome) => {
            log::debug!("Run outcome: {outcome:?}");
            ExitCode::from(commands::exit_code(outcome))
        }
        Err(e) => {
            ui::error(&format!("{e:#}"));
            if ctx.verbose > 0 {
                log::debug!("{e:?}");
            }
            if e.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
