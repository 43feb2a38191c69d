//! `diff` and `apply` - converge declared variables and secrets

use crate::Context;
use crate::cli::{ApplyArgs, OutputFormat, TargetArgs};
use crate::output;
use crate::progress::BarProgress;
use crate::store::EnvSecrets;
use crate::ui;
use anyhow::Result;
use declarative::{
    ClassFilter, Mode, NoProgress, ResourceClass, RunOutcome, RunPlan, run_sync, stage_sync, sync,
};

use super::{confirm, connect, has_planned_writes, interactive, jobs, load};

/// Report what apply would do. Never writes.
pub fn diff(ctx: &Context, args: &TargetArgs) -> Result<RunOutcome> {
    let (config, org) = load(ctx)?;
    let mut plan = RunPlan::new(&org, Mode::DryRun);
    plan.classes = ClassFilter::parse(args.only.as_deref())?;

    let store = connect(&config, &org)?;
    let secrets = EnvSecrets::new(config.secret_sources.clone());

    let report = sync(&plan, &config.declared, &store, &secrets, &NoProgress);
    output::print_report(&report, ctx.format)?;
    Ok(report.outcome())
}

/// Create and update declared keys
pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<RunOutcome> {
    let (config, org) = load(ctx)?;
    let mut plan = RunPlan::new(&org, Mode::from_dry_run(args.dry_run));
    plan.classes = ClassFilter::parse(args.target.only.as_deref())?;
    plan.opts.jobs = jobs(args.jobs, &config);

    let store = connect(&config, &org)?;
    let secrets = EnvSecrets::new(config.secret_sources.clone());

    if !args.dry_run && plan.classes.includes(ResourceClass::Secrets) {
        for (name, env) in secrets.missing() {
            ui::warn(&format!("secret {name}: environment variable {env} is not set"));
        }
    }

    let staged = stage_sync(&plan, &config.declared, &store);

    if !args.dry_run && interactive(ctx, args.yes) {
        let mut preview_plan = plan.clone();
        preview_plan.mode = Mode::DryRun;
        let preview = run_sync(
            &preview_plan,
            &staged,
            &config.declared,
            &store,
            &secrets,
            &NoProgress,
        );
        output::print_report(&preview, ctx.format)?;

        if !has_planned_writes(&preview) {
            ui::success("Nothing to apply");
            return Ok(preview.outcome());
        }
        if !confirm(&format!("Apply these changes to {org}?"))? {
            ui::info("Cancelled, nothing was changed");
            return Ok(RunOutcome::Success);
        }
    }

    log::info!("Syncing {org} ({}, {} jobs)", plan.mode, plan.opts.jobs);
    let progress = BarProgress::new(ctx.quiet || ctx.format != OutputFormat::Text);
    let report = run_sync(&plan, &staged, &config.declared, &store, &secrets, &progress);
    output::print_report(&report, ctx.format)?;
    Ok(report.outcome())
}
