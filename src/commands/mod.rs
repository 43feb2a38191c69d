//! Command implementations
//!
//! - `diff` / `apply` - create and update declared keys ([`sync`])
//! - `cleanup` - delete undeclared keys behind the safety gate ([`cleanup`])
//! - `validate` - check the declared state offline ([`validate`])

pub mod cleanup;
pub mod sync;
pub mod validate;

use crate::Context;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::paths;
use crate::store::GhStore;
use anyhow::{Context as AnyhowContext, Result};
use declarative::{DEFAULT_JOBS, RunOutcome, RunReport};
use ghkit::OrgSettings;

/// Load the declared state and resolve the organization
pub(crate) fn load(ctx: &Context) -> Result<(Config, String)> {
    let dir = paths::config_dir(ctx.config_dir.as_deref())?;
    let config = Config::load(&dir)?;
    let org = config.organization(ctx.org.as_deref())?;
    Ok((config, org))
}

/// Connect to GitHub for `org` using the file settings
pub(crate) fn connect(config: &Config, org: &str) -> Result<GhStore> {
    let settings = OrgSettings {
        visibility: config.settings.visibility,
        secret_app: config.settings.secret_app,
    };
    let client = ghkit::Client::new(org, settings)
        .with_context(|| format!("Cannot reach GitHub for organization {org}"))?;
    Ok(GhStore::new(client))
}

/// Worker count: flag, then settings, then default
pub(crate) fn jobs(flag: Option<usize>, config: &Config) -> usize {
    flag.or(config.settings.jobs).unwrap_or(DEFAULT_JOBS).max(1)
}

/// Whether the operator can be asked before writing
pub(crate) fn interactive(ctx: &Context, yes: bool) -> bool {
    !yes && ctx.format == OutputFormat::Text && console::Term::stdout().is_term()
}

/// Ask before a write; `false` means leave the remote untouched
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    Ok(confirmed)
}

/// Whether a dry-run report would lead to any remote write
pub(crate) fn has_planned_writes(report: &RunReport) -> bool {
    report.classes.iter().any(|c| {
        c.records
            .iter()
            .any(|r| r.result == declarative::KeyResult::Planned)
    })
}

/// Exit status for a finished run
pub fn exit_code(outcome: RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Success => 0,
        RunOutcome::Failed => 1,
        RunOutcome::Aborted => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{DeclaredState, MemoryStore, Mode, NoProgress, RunPlan, clean, sync};
    use std::collections::BTreeMap;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(RunOutcome::Success), 0);
        assert_eq!(exit_code(RunOutcome::Failed), 1);
        assert_eq!(exit_code(RunOutcome::Aborted), 2);
    }

    #[test]
    fn test_jobs_precedence() {
        let mut config = Config::default();
        assert_eq!(jobs(None, &config), DEFAULT_JOBS);
        config.settings.jobs = Some(2);
        assert_eq!(jobs(None, &config), 2);
        assert_eq!(jobs(Some(9), &config), 9);
        assert_eq!(jobs(Some(0), &config), 1);
    }

    #[test]
    fn test_has_planned_writes() {
        let store = MemoryStore::new().with_variable("A", "1");
        let mut declared = DeclaredState::default();
        declared.variables.insert("A".into(), "1".into());
        let plan = RunPlan::new("acme", Mode::DryRun);
        let secrets = BTreeMap::<String, String>::new();

        let report = sync(&plan, &declared, &store, &secrets, &NoProgress);
        assert!(!has_planned_writes(&report));

        declared.variables.insert("B".into(), "2".into());
        let report = sync(&plan, &declared, &store, &secrets, &NoProgress);
        assert!(has_planned_writes(&report));

        let report = clean(&plan, &declared, &store, &NoProgress);
        assert!(!has_planned_writes(&report));
    }
}
