//! Cleanup executor - deletes stale keys after the safety gate

use crate::context::{ProgressCallback, RemoteStore};
use crate::executor::run_pool;
use crate::gate::SafetyDecision;
use crate::report::{Action, ClassReport, ClassStatus, KeyRecord, KeyResult, Phase};
use crate::types::{Mode, ResourceClass, RunOptions};
use std::collections::BTreeSet;

/// Run cleanup for one resource class
///
/// A refused decision yields an `Aborted` report listing every stale key and
/// makes no store calls. Otherwise dry-run lists the keys that would be
/// deleted, and apply issues one delete per stale key, recording failures
/// without stopping.
pub fn cleanup<S, P>(
    class: ResourceClass,
    stale: &BTreeSet<String>,
    decision: SafetyDecision,
    mode: Mode,
    opts: &RunOptions,
    store: &S,
    progress: &P,
) -> ClassReport
where
    S: RemoteStore + ?Sized,
    P: ProgressCallback + ?Sized,
{
    if decision.is_abort() {
        log::warn!(
            "Refusing to delete {} stale {} (threshold {})",
            decision.count,
            class,
            decision.threshold
        );
        return ClassReport {
            class,
            phase: Phase::Cleanup,
            mode,
            status: ClassStatus::Aborted {
                count: decision.count,
                threshold: decision.threshold,
            },
            records: stale
                .iter()
                .map(|name| KeyRecord::new(name.as_str(), Action::Delete, KeyResult::Refused))
                .collect(),
        };
    }

    if mode.is_dry_run() {
        let records = stale
            .iter()
            .map(|name| KeyRecord::new(name.as_str(), Action::Delete, KeyResult::Planned))
            .collect();
        return ClassReport::from_records(class, Phase::Cleanup, mode, records);
    }

    let keys: Vec<&str> = stale.iter().map(String::as_str).collect();

    log::info!("Deleting {} stale {}", keys.len(), class);
    progress.on_class_start(class, Phase::Cleanup, keys.len());

    let deleted = run_pool(opts.jobs, &keys, |name| {
        let result = match store.delete(class, name) {
            Ok(()) => KeyResult::Applied,
            Err(e) => {
                log::debug!("Failed to delete {} {name}: {e:#}", class.noun());
                KeyResult::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        let record = KeyRecord::new(*name, Action::Delete, result);
        progress.on_key_complete(class, &record);
        record
    });

    progress.on_class_complete(class);

    match deleted {
        Ok(records) => ClassReport::from_records(class, Phase::Cleanup, mode, records),
        Err(e) => ClassReport::unavailable(class, Phase::Cleanup, mode, format!("{e:#}")),
    }
}
