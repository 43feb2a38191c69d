//! `cleanup` - delete remote entries that are no longer declared
//!
//! Each class is gated on its own: more stale entries than the threshold
//! refuses the whole class and nothing in it is deleted.

use crate::Context;
use crate::cli::{CleanupArgs, OutputFormat};
use crate::output;
use crate::progress::BarProgress;
use crate::ui;
use anyhow::Result;
use declarative::{
    ClassFilter, DEFAULT_DELETION_THRESHOLD, Mode, NoProgress, RunOutcome, RunPlan, run_cleanup,
    stage_cleanup,
};

use super::{confirm, connect, has_planned_writes, interactive, jobs, load};

pub fn run(ctx: &Context, args: &CleanupArgs) -> Result<RunOutcome> {
    let (config, org) = load(ctx)?;
    let mut plan = RunPlan::new(&org, Mode::from_dry_run(args.dry_run));
    plan.classes = ClassFilter::parse(args.target.only.as_deref())?;
    plan.opts.jobs = jobs(args.jobs, &config);
    plan.opts.deletion_threshold = args
        .threshold
        .or(config.settings.deletion_threshold)
        .unwrap_or(DEFAULT_DELETION_THRESHOLD);

    let store = connect(&config, &org)?;
    let staged = stage_cleanup(&plan, &config.declared, &store);

    if !args.dry_run && interactive(ctx, args.yes) {
        let mut preview_plan = plan.clone();
        preview_plan.mode = Mode::DryRun;
        let preview = run_cleanup(&preview_plan, &staged, &store, &NoProgress);
        output::print_report(&preview, ctx.format)?;

        // An aborted class stays aborted in the real pass, so the prompt
        // only matters when something would actually be deleted
        if !has_planned_writes(&preview) {
            return Ok(preview.outcome());
        }
        if !confirm(&format!("Delete these entries from {org}?"))? {
            ui::info("Cancelled, nothing was deleted");
            return Ok(RunOutcome::Success);
        }
    }

    log::info!(
        "Cleaning {} ({}, threshold {})",
        org,
        plan.mode,
        plan.opts.deletion_threshold
    );
    let progress = BarProgress::new(ctx.quiet || ctx.format != OutputFormat::Text);
    let report = run_cleanup(&plan, &staged, &store, &progress);
    output::print_report(&report, ctx.format)?;

    if report.outcome() == RunOutcome::Aborted {
        ui::error("Cleanup refused: too many stale entries. Review the list above, then raise --threshold or delete them by hand.");
    }

    Ok(report.outcome())
}
