//! `validate` - load and check the declared state offline

use crate::Context;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::paths;
use crate::store::EnvSecrets;
use crate::ui;
use anyhow::Result;
use declarative::{DEFAULT_DELETION_THRESHOLD, DEFAULT_JOBS, RunOutcome};
use serde::Serialize;

/// Machine-readable validation summary
#[derive(Debug, Serialize)]
struct Summary<'a> {
    config_dir: String,
    organization: Option<String>,
    variables: Vec<&'a str>,
    secrets: Vec<&'a str>,
    unset_secret_sources: Vec<&'a str>,
}

pub fn run(ctx: &Context) -> Result<RunOutcome> {
    let dir = paths::config_dir(ctx.config_dir.as_deref())?;
    let config = Config::load(&dir)?;
    let organization = config.organization(ctx.org.as_deref()).ok();

    let env = EnvSecrets::new(config.secret_sources.clone());
    let missing = env.missing();

    let summary = Summary {
        config_dir: config.dir.display().to_string(),
        organization,
        variables: config.declared.variables.keys().map(String::as_str).collect(),
        secrets: config.declared.secrets.iter().map(String::as_str).collect(),
        unset_secret_sources: missing.iter().map(|(name, _)| *name).collect(),
    };

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_text(&config, &summary, &missing),
    }

    Ok(RunOutcome::Success)
}

fn print_text(config: &Config, summary: &Summary<'_>, missing: &[(&str, &str)]) {
    ui::header("Declared state");
    ui::kv("Config dir", &summary.config_dir);
    ui::kv(
        "Organization",
        summary.organization.as_deref().unwrap_or("(not set)"),
    );
    ui::kv("Variables", &summary.variables.len().to_string());
    ui::kv("Secrets", &summary.secrets.len().to_string());
    ui::kv(
        "Deletion threshold",
        &config
            .settings
            .deletion_threshold
            .unwrap_or(DEFAULT_DELETION_THRESHOLD)
            .to_string(),
    );
    ui::kv(
        "Jobs",
        &config.settings.jobs.unwrap_or(DEFAULT_JOBS).to_string(),
    );
    if let Some(v) = config.settings.visibility {
        ui::kv("Visibility", v.as_str());
    }
    ui::kv("Secret app", config.settings.secret_app.as_str());

    println!();
    for (name, env) in missing {
        ui::warn(&format!(
            "secret {name}: environment variable {env} is not set (apply will fail for it)"
        ));
    }
    ui::success("Configuration is valid");
}
