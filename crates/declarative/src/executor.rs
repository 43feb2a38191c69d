//! Reconciliation engine - upserts declared keys with bounded parallelism

use crate::context::{ProgressCallback, RemoteStore, ValueSource};
use crate::diff::Diff;
use crate::report::{Action, ClassReport, KeyRecord, KeyResult, Phase};
use crate::types::{Mode, ResourceClass, RunOptions};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::sync::Mutex;

/// Reconcile one resource class
///
/// In dry-run mode every declared key gets a `Planned` (or `Skipped` for
/// unchanged) record and no store method is called. In apply mode every key
/// that needs a write gets exactly one upsert; failures are recorded per key
/// and never stop the remaining keys.
pub fn reconcile<S, V, P>(
    diff: &Diff,
    mode: Mode,
    opts: &RunOptions,
    store: &S,
    values: &V,
    progress: &P,
) -> ClassReport
where
    S: RemoteStore + ?Sized,
    V: ValueSource + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let class = diff.class;

    let skipped = diff
        .entries
        .iter()
        .filter(|(_, c)| !c.needs_write())
        .map(|(name, c)| KeyRecord::new(name.as_str(), Action::from(*c), KeyResult::Skipped));

    if mode.is_dry_run() {
        let planned = diff
            .pending()
            .map(|(name, c)| KeyRecord::new(name, Action::from(c), KeyResult::Planned));
        let records = skipped.chain(planned).collect();
        return ClassReport::from_records(class, Phase::Sync, mode, records);
    }

    let mut records: Vec<KeyRecord> = skipped.collect();
    let pending: Vec<(&str, Action)> = diff.pending().map(|(n, c)| (n, c.into())).collect();

    log::info!("Applying {} {} of {}", pending.len(), class, diff.entries.len());
    progress.on_class_start(class, Phase::Sync, pending.len());

    let applied = run_pool(opts.jobs, &pending, |(name, action)| {
        let result = match upsert_one(store, values, class, name) {
            Ok(()) => KeyResult::Applied,
            Err(e) => {
                log::debug!("Failed to upsert {} {name}: {e:#}", class.noun());
                KeyResult::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        let record = KeyRecord::new(*name, *action, result);
        progress.on_key_complete(class, &record);
        record
    });

    progress.on_class_complete(class);

    match applied {
        Ok(applied) => {
            records.extend(applied);
            ClassReport::from_records(class, Phase::Sync, mode, records)
        }
        Err(e) => ClassReport::unavailable(class, Phase::Sync, mode, format!("{e:#}")),
    }
}

fn upsert_one<S, V>(store: &S, values: &V, class: ResourceClass, name: &str) -> Result<()>
where
    S: RemoteStore + ?Sized,
    V: ValueSource + ?Sized,
{
    let value = values
        .value_for(name)
        .with_context(|| format!("No value available for {} {name}", class.noun()))?;
    store.upsert(class, name, &value)
}

/// Run `work` over `items` on a pool of `jobs` threads, collecting records
///
/// Records are collected in completion order; callers sort via
/// [`ClassReport::from_records`].
pub(crate) fn run_pool<T, F>(jobs: usize, items: &[T], work: F) -> Result<Vec<KeyRecord>>
where
    T: Sync,
    F: Fn(&T) -> KeyRecord + Send + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let results = Mutex::new(Vec::with_capacity(items.len()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create worker pool")?;

    pool.install(|| {
        items.par_iter().for_each(|item| {
            push_record(&results, work(item));
        });
    });

    Ok(results
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner))
}

fn push_record(results: &Mutex<Vec<KeyRecord>>, record: KeyRecord) {
    match results.lock() {
        Ok(mut locked) => locked.push(record),
        Err(poisoned) => poisoned.into_inner().push(record),
    }
}
