//! Run planner - drives each resource class through its own independent pass

use crate::cleanup::cleanup;
use crate::context::{ProgressCallback, RemoteStore, ValueSource};
use crate::diff::{Diff, diff, stale};
use crate::executor::reconcile;
use crate::gate::{SafetyDecision, gate};
use crate::report::{ClassReport, Phase, RunReport};
use crate::types::{Mode, ResourceClass, RunOptions, Snapshot};
use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet};

/// Desired state for one organization, loaded once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredState {
    /// Variable name → value
    pub variables: BTreeMap<String, String>,
    /// Secret names (values are resolved at apply time)
    pub secrets: BTreeSet<String>,
}

impl DeclaredState {
    /// Declared state of one class in snapshot form
    pub fn snapshot(&self, class: ResourceClass) -> Snapshot {
        match class {
            ResourceClass::Variables => self
                .variables
                .iter()
                .map(|(name, value)| (name.clone(), Some(value.clone())))
                .collect(),
            ResourceClass::Secrets => self.secrets.iter().map(|name| (name.clone(), None)).collect(),
        }
    }
}

/// Selected resource classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFilter {
    classes: Vec<ResourceClass>,
}

impl ClassFilter {
    /// Both classes
    pub fn all() -> Self {
        Self {
            classes: ResourceClass::ALL.to_vec(),
        }
    }

    /// Parse a comma-separated target list like "variables,secrets"
    ///
    /// `None` selects every class.
    pub fn parse(target: Option<&str>) -> Result<Self> {
        let Some(target) = target else {
            return Ok(Self::all());
        };

        let mut classes = BTreeSet::new();
        for part in target.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part {
                "variables" | "variable" | "vars" | "var" => {
                    classes.insert(ResourceClass::Variables);
                }
                "secrets" | "secret" => {
                    classes.insert(ResourceClass::Secrets);
                }
                "all" => classes.extend(ResourceClass::ALL),
                other => bail!("Unknown target '{other}' (expected variables or secrets)"),
            }
        }

        if classes.is_empty() {
            bail!("Empty target list");
        }

        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    pub fn classes(&self) -> &[ResourceClass] {
        &self.classes
    }

    pub fn includes(&self, class: ResourceClass) -> bool {
        self.classes.contains(&class)
    }
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Everything a run needs besides the collaborators
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub organization: String,
    pub classes: ClassFilter,
    pub mode: Mode,
    pub opts: RunOptions,
}

impl RunPlan {
    pub fn new(organization: impl Into<String>, mode: Mode) -> Self {
        Self {
            organization: organization.into(),
            classes: ClassFilter::all(),
            mode,
            opts: RunOptions::default(),
        }
    }
}

/// Snapshot one class and diff it against the declared state
pub fn plan_class<S: RemoteStore + ?Sized>(
    class: ResourceClass,
    declared: &DeclaredState,
    store: &S,
) -> Result<Diff> {
    let remote = store.snapshot(class)?;
    log::debug!("Remote {class}: {} entries", remote.len());
    Ok(diff(class, &declared.snapshot(class), &remote))
}

/// Work staged for one class from a single remote snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staged<T> {
    Ready(T),
    Unavailable { class: ResourceClass, error: String },
}

impl<T> Staged<T> {
    fn from_snapshot(class: ResourceClass, result: Result<T>) -> Self {
        match result {
            Ok(work) => Self::Ready(work),
            Err(e) => {
                log::error!("Could not read remote {class}: {e:#}");
                Self::Unavailable {
                    class,
                    error: format!("could not read remote {class}: {e:#}"),
                }
            }
        }
    }
}

/// Stale names of one class and the gate's verdict on them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleSet {
    pub class: ResourceClass,
    pub names: BTreeSet<String>,
    pub decision: SafetyDecision,
}

/// Snapshot and diff every selected class
pub fn stage_sync<S: RemoteStore + ?Sized>(
    plan: &RunPlan,
    declared: &DeclaredState,
    store: &S,
) -> Vec<Staged<Diff>> {
    plan.classes
        .classes()
        .iter()
        .map(|&class| Staged::from_snapshot(class, plan_class(class, declared, store)))
        .collect()
}

/// Create/update the keys of previously staged diffs
///
/// Each class is an independent pass: a snapshot failure or key failures
/// in one class never stop the other.
pub fn run_sync<S, V, P>(
    plan: &RunPlan,
    staged: &[Staged<Diff>],
    declared: &DeclaredState,
    store: &S,
    secret_values: &V,
    progress: &P,
) -> RunReport
where
    S: RemoteStore + ?Sized,
    V: ValueSource + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let mut report = RunReport::new(&plan.organization, Phase::Sync, plan.mode);

    for work in staged {
        let class_report = match work {
            Staged::Ready(d) => match d.class {
                ResourceClass::Variables => reconcile(
                    d,
                    plan.mode,
                    &plan.opts,
                    store,
                    &declared.variables,
                    progress,
                ),
                ResourceClass::Secrets => {
                    reconcile(d, plan.mode, &plan.opts, store, secret_values, progress)
                }
            },
            Staged::Unavailable { class, error } => {
                ClassReport::unavailable(*class, Phase::Sync, plan.mode, error.clone())
            }
        };
        report.classes.push(class_report);
    }

    report
}

/// Create/update declared keys for every selected class
pub fn sync<S, V, P>(
    plan: &RunPlan,
    declared: &DeclaredState,
    store: &S,
    secret_values: &V,
    progress: &P,
) -> RunReport
where
    S: RemoteStore + ?Sized,
    V: ValueSource + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let staged = stage_sync(plan, declared, store);
    run_sync(plan, &staged, declared, store, secret_values, progress)
}

/// Snapshot every selected class, compute its stale set and gate it
pub fn stage_cleanup<S: RemoteStore + ?Sized>(
    plan: &RunPlan,
    declared: &DeclaredState,
    store: &S,
) -> Vec<Staged<StaleSet>> {
    plan.classes
        .classes()
        .iter()
        .map(|&class| {
            let stale_set = store.snapshot(class).map(|remote| {
                let names = stale(&declared.snapshot(class), &remote);
                let decision = gate(&names, plan.opts.deletion_threshold);
                log::debug!(
                    "Stale {class}: {} (threshold {}, proceed {})",
                    decision.count,
                    decision.threshold,
                    decision.proceed
                );
                StaleSet {
                    class,
                    names,
                    decision,
                }
            });
            Staged::from_snapshot(class, stale_set)
        })
        .collect()
}

/// Delete previously staged stale sets
///
/// Only the names staged are touched, whatever the remote holds by now.
pub fn run_cleanup<S, P>(
    plan: &RunPlan,
    staged: &[Staged<StaleSet>],
    store: &S,
    progress: &P,
) -> RunReport
where
    S: RemoteStore + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let mut report = RunReport::new(&plan.organization, Phase::Cleanup, plan.mode);

    for work in staged {
        let class_report = match work {
            Staged::Ready(set) => cleanup(
                set.class,
                &set.names,
                set.decision,
                plan.mode,
                &plan.opts,
                store,
                progress,
            ),
            Staged::Unavailable { class, error } => {
                ClassReport::unavailable(*class, Phase::Cleanup, plan.mode, error.clone())
            }
        };
        report.classes.push(class_report);
    }

    report
}

/// Delete undeclared keys for every selected class, gated per class
pub fn clean<S, P>(
    plan: &RunPlan,
    declared: &DeclaredState,
    store: &S,
    progress: &P,
) -> RunReport
where
    S: RemoteStore + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let staged = stage_cleanup(plan, declared, store);
    run_cleanup(plan, &staged, store, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::memory::MemoryStore;
    use crate::report::{Action, ClassStatus, KeyResult, RunOutcome};

    fn declared(vars: &[(&str, &str)], secrets: &[&str]) -> DeclaredState {
        DeclaredState {
            variables: vars
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            secrets: secrets.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn secret_values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(ClassFilter::parse(None).unwrap(), ClassFilter::all());
        assert_eq!(
            ClassFilter::parse(Some("vars")).unwrap().classes(),
            &[ResourceClass::Variables]
        );
        assert_eq!(
            ClassFilter::parse(Some("secrets, variables")).unwrap().classes(),
            &[ResourceClass::Variables, ResourceClass::Secrets]
        );
        assert!(ClassFilter::parse(Some("packages")).is_err());
        assert!(ClassFilter::parse(Some(" , ")).is_err());
    }

    #[test]
    fn test_dry_run_sync_is_pure() {
        let store = MemoryStore::new()
            .with_variable("A", "old")
            .with_variable("STALE", "x")
            .with_secret("TOKEN");
        let state = declared(&[("A", "new"), ("B", "1")], &["TOKEN", "NEW_TOKEN"]);
        let plan = RunPlan::new("acme", Mode::DryRun);

        let report = sync(&plan, &state, &store, &secret_values(&[]), &NoProgress);

        assert_eq!(store.mutation_count(), 0);
        assert_eq!(report.outcome(), RunOutcome::Success);
        let secrets = report.class(ResourceClass::Secrets).unwrap();
        assert_eq!(secrets.records[0].name, "NEW_TOKEN");
        assert_eq!(secrets.records[0].action, Action::Create);
        assert_eq!(secrets.records[1].action, Action::UpdateUnknown);
    }

    #[test]
    fn test_dry_run_cleanup_is_pure() {
        let store = MemoryStore::new()
            .with_variable("A", "1")
            .with_variable("B", "2")
            .with_secret("S1");
        let plan = RunPlan::new("acme", Mode::DryRun);

        let report = clean(&plan, &DeclaredState::default(), &store, &NoProgress);

        assert_eq!(store.mutation_count(), 0);
        assert_eq!(report.outcome(), RunOutcome::Success);
    }

    #[test]
    fn test_apply_sync_both_classes() {
        let store = MemoryStore::new();
        let state = declared(&[("A", "1")], &["TOKEN"]);
        let plan = RunPlan::new("acme", Mode::Apply);

        let report = sync(
            &plan,
            &state,
            &store,
            &secret_values(&[("TOKEN", "t")]),
            &NoProgress,
        );

        assert_eq!(report.outcome(), RunOutcome::Success);
        assert_eq!(store.variable("A").as_deref(), Some("1"));
        assert!(store.secret_names().contains("TOKEN"));
    }

    #[test]
    fn test_secret_abort_does_not_block_variable_cleanup() {
        let mut store = MemoryStore::new().with_variable("KEEP", "1").with_variable("OLD", "2");
        for i in 1..=6 {
            store = store.with_secret(&format!("S{i}"));
        }
        let state = declared(&[("KEEP", "1")], &[]);
        let plan = RunPlan::new("acme", Mode::Apply);

        let report = clean(&plan, &state, &store, &NoProgress);

        assert_eq!(report.outcome(), RunOutcome::Aborted);
        assert!(report.class(ResourceClass::Secrets).unwrap().is_aborted());
        assert!(report.class(ResourceClass::Variables).unwrap().is_success());
        assert_eq!(
            store.variable_names(),
            ["KEEP".to_string()].into_iter().collect()
        );
        assert_eq!(store.secret_names().len(), 6);
    }

    #[test]
    fn test_variable_abort_does_not_block_secret_cleanup() {
        let mut store = MemoryStore::new().with_secret("OLD_SECRET");
        for i in 1..=6 {
            store = store.with_variable(&format!("V{i}"), "x");
        }
        let plan = RunPlan::new("acme", Mode::Apply);

        let report = clean(&plan, &DeclaredState::default(), &store, &NoProgress);

        assert!(report.class(ResourceClass::Variables).unwrap().is_aborted());
        assert!(report.class(ResourceClass::Secrets).unwrap().is_success());
        assert!(store.secret_names().is_empty());
        assert_eq!(store.variable_names().len(), 6);
    }

    #[test]
    fn test_snapshot_failure_is_class_local() {
        let store = MemoryStore::new().fail_list(ResourceClass::Variables);
        let state = declared(&[("A", "1")], &["TOKEN"]);
        let plan = RunPlan::new("acme", Mode::Apply);

        let report = sync(
            &plan,
            &state,
            &store,
            &secret_values(&[("TOKEN", "t")]),
            &NoProgress,
        );

        assert!(matches!(
            report.class(ResourceClass::Variables).unwrap().status,
            ClassStatus::Unavailable { .. }
        ));
        assert!(report.class(ResourceClass::Secrets).unwrap().is_success());
        assert_eq!(report.outcome(), RunOutcome::Failed);
    }

    #[test]
    fn test_filter_limits_classes() {
        let store = MemoryStore::new().with_secret("OLD");
        let mut plan = RunPlan::new("acme", Mode::Apply);
        plan.classes = ClassFilter::parse(Some("variables")).unwrap();

        let report = clean(&plan, &DeclaredState::default(), &store, &NoProgress);

        assert_eq!(report.classes.len(), 1);
        assert!(store.secret_names().contains("OLD"));
    }

    #[test]
    fn test_abort_lists_full_stale_set() {
        let mut store = MemoryStore::new();
        for i in 1..=6 {
            store = store.with_variable(&format!("V{i}"), "x");
        }
        let mut plan = RunPlan::new("acme", Mode::Apply);
        plan.classes = ClassFilter::parse(Some("variables")).unwrap();

        let report = clean(&plan, &DeclaredState::default(), &store, &NoProgress);
        let vars = report.class(ResourceClass::Variables).unwrap();

        let names: Vec<_> = vars.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["V1", "V2", "V3", "V4", "V5", "V6"]);
        assert!(vars.records.iter().all(|r| r.result == KeyResult::Refused));
    }

    #[test]
    fn test_identical_inputs_produce_identical_reports() {
        let build = || {
            MemoryStore::new()
                .with_variable("B", "1")
                .with_variable("A", "2")
                .with_secret("S")
        };
        let state = declared(&[("A", "3"), ("C", "4")], &["S", "T"]);
        let plan = RunPlan::new("acme", Mode::DryRun);

        let first = sync(&plan, &state, &build(), &secret_values(&[]), &NoProgress);
        let second = sync(&plan, &state, &build(), &secret_values(&[]), &NoProgress);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_cleanup_acts_on_staged_stale_set() {
        let store = MemoryStore::new()
            .with_variable("KEEP", "1")
            .with_variable("OLD", "2");
        let state = declared(&[("KEEP", "1")], &[]);
        let mut plan = RunPlan::new("acme", Mode::DryRun);
        plan.classes = ClassFilter::parse(Some("variables")).unwrap();

        let staged = stage_cleanup(&plan, &state, &store);
        let preview = run_cleanup(&plan, &staged, &store, &NoProgress);

        store.upsert_variable("LATE", "3").unwrap();

        plan.mode = Mode::Apply;
        let report = run_cleanup(&plan, &staged, &store, &NoProgress);

        let previewed: Vec<_> = preview.classes[0].records.iter().map(|r| r.name.as_str()).collect();
        let deleted: Vec<_> = report.classes[0].records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(previewed, deleted);
        assert_eq!(deleted, vec!["OLD"]);
        assert_eq!(
            store.variable_names(),
            ["KEEP".to_string(), "LATE".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn test_staged_snapshot_failure_reports_unavailable() {
        let store = MemoryStore::new()
            .with_secret("OLD")
            .fail_list(ResourceClass::Variables);
        let plan = RunPlan::new("acme", Mode::Apply);

        let staged = stage_cleanup(&plan, &DeclaredState::default(), &store);
        assert!(matches!(
            staged[0],
            Staged::Unavailable {
                class: ResourceClass::Variables,
                ..
            }
        ));

        let report = run_cleanup(&plan, &staged, &store, &NoProgress);
        assert!(matches!(
            report.class(ResourceClass::Variables).unwrap().status,
            ClassStatus::Unavailable { .. }
        ));
        assert!(store.secret_names().is_empty());
    }

    #[test]
    fn test_sync_writes_staged_diff() {
        let store = MemoryStore::new().with_variable("A", "old");
        let state = declared(&[("A", "new")], &[]);
        let mut plan = RunPlan::new("acme", Mode::Apply);
        plan.classes = ClassFilter::parse(Some("variables")).unwrap();

        let staged = stage_sync(&plan, &state, &store);
        store.upsert_variable("A", "new").unwrap();
        let report = run_sync(&plan, &staged, &state, &store, &secret_values(&[]), &NoProgress);

        let vars = report.class(ResourceClass::Variables).unwrap();
        assert_eq!(vars.records[0].action, Action::Update);
        assert_eq!(vars.records[0].result, KeyResult::Applied);
    }
}
