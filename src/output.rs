//! Run report display - text for operators, JSON for review tooling

use crate::cli::OutputFormat;
use anyhow::Result;
use colored::{ColoredString, Colorize};
use declarative::{Action, ClassReport, ClassStatus, KeyRecord, KeyResult, RunReport};

use crate::ui;

/// Print a run report in the requested format
pub fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(report)?),
        OutputFormat::Text => print_text(report),
    }
    Ok(())
}

/// Pretty JSON; identical inputs give identical bytes
pub fn to_json(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn print_text(report: &RunReport) {
    ui::header(&format!(
        "{} {} ({})",
        report.organization, report.phase, report.mode
    ));

    for class in &report.classes {
        print_class(class);
    }

    println!();
}

fn print_class(class: &ClassReport) {
    let title = class.class.as_str();
    ui::section(&format!("{}{}", title[..1].to_uppercase(), &title[1..]));

    match &class.status {
        ClassStatus::Unavailable { error } => {
            ui::error(error);
            return;
        }
        ClassStatus::Aborted { count, threshold } => {
            ui::warn(&format!(
                "Refusing to delete {} (threshold is {threshold}). Nothing was deleted.",
                ui::plural(*count, class.class.noun()),
            ));
        }
        _ => {}
    }

    if class.records.is_empty() {
        ui::dim("nothing declared or stale");
        return;
    }

    let width = class
        .records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);

    for record in &class.records {
        println!("  {} {:<width$}  {}", symbol(record), record.name, describe(record));
    }

    summary(class);
}

fn symbol(record: &KeyRecord) -> ColoredString {
    if record.result.is_failure() {
        return "✗".red();
    }
    match record.action {
        Action::Create => "+".green(),
        Action::Update | Action::UpdateUnknown => "~".yellow(),
        Action::Unchanged => "=".dimmed(),
        Action::Delete => "-".red(),
    }
}

fn describe(record: &KeyRecord) -> ColoredString {
    match &record.result {
        KeyResult::Planned => record.action.planned_phrase().normal(),
        KeyResult::Applied => record.action.applied_phrase().normal(),
        KeyResult::Skipped => record.action.applied_phrase().dimmed(),
        KeyResult::Refused => "not deleted".dimmed(),
        KeyResult::Failed { error } => format!("failed: {error}").red(),
    }
}

fn summary(class: &ClassReport) {
    let parts: Vec<String> = [
        (Action::Create, "create"),
        (Action::Update, "update"),
        (Action::UpdateUnknown, "update (not comparable)"),
        (Action::Unchanged, "unchanged"),
        (Action::Delete, "delete"),
    ]
    .into_iter()
    .filter_map(|(action, label)| {
        let n = class.count(action);
        (n > 0).then(|| format!("{n} {label}"))
    })
    .collect();

    if !parts.is_empty() {
        ui::dim(&parts.join(", "));
    }

    let failed = class.failed_keys();
    if !failed.is_empty() {
        ui::error(&format!(
            "{} failed: {}",
            ui::plural(failed.len(), class.class.noun()),
            failed.join(", ")
        ));
    }
}
