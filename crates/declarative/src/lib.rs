//! # Declarative
//!
//! Reconciliation of declared organization state against a remote
//! key-value store.
//!
//! This crate compares a declared set of variables and secrets with a
//! snapshot of what the remote store holds, converges the store to the
//! declared state, and removes undeclared entries behind a safety gate.
//!
//! ## Core Concepts
//!
//! - **Diff**: per-key classification (`Create`, `Update`, `Unchanged`,
//!   `UpdateUnknown`) and the stale set `remote − declared`
//! - **Reconcile**: upsert every key that needs a write, in parallel
//! - **Gate**: refuse a whole cleanup when the stale set exceeds a threshold
//! - **Cleanup**: delete the stale set, in parallel
//!
//! Variables are value-comparable. Secrets are write-only, so a secret that
//! exists remotely is always `UpdateUnknown` and is re-written on every apply.
//!
//! ## Example
//!
//! ```
//! use declarative::{
//!     DeclaredState, MemoryStore, Mode, NoProgress, RunOutcome, RunPlan, sync,
//! };
//! use std::collections::BTreeMap;
//!
//! let store = MemoryStore::new().with_variable("REGION", "eu-west-1");
//!
//! let mut declared = DeclaredState::default();
//! declared.variables.insert("REGION".into(), "us-east-1".into());
//!
//! let plan = RunPlan::new("acme", Mode::Apply);
//! let secrets: BTreeMap<String, String> = BTreeMap::new();
//! let report = sync(&plan, &declared, &store, &secrets, &NoProgress);
//!
//! assert_eq!(report.outcome(), RunOutcome::Success);
//! assert_eq!(store.variable("REGION").as_deref(), Some("us-east-1"));
//! ```
//!
//! ## Provider Traits
//!
//! - [`RemoteStore`]: list/upsert/delete per resource class
//! - [`ValueSource`]: resolves values to write at apply time
//! - [`ProgressCallback`]: receives per-key progress from workers

pub mod cleanup;
pub mod context;
pub mod diff;
pub mod executor;
pub mod gate;
pub mod memory;
pub mod planner;
pub mod report;
pub mod types;

// Re-export main types at crate root
pub use cleanup::cleanup;
pub use context::{NoProgress, ProgressCallback, RemoteStore, ValueSource};
pub use diff::{Diff, diff, stale};
pub use executor::reconcile;
pub use gate::{SafetyDecision, gate};
pub use memory::{Call, MemoryStore};
pub use planner::{
    ClassFilter, DeclaredState, RunPlan, Staged, StaleSet, clean, plan_class, run_cleanup, run_sync,
    stage_cleanup, stage_sync, sync,
};
pub use report::{
    Action, ClassReport, ClassStatus, KeyRecord, KeyResult, Phase, RunOutcome, RunReport,
};
pub use types::{
    Classification, DEFAULT_DELETION_THRESHOLD, DEFAULT_JOBS, Mode, ResourceClass, RunOptions,
    Snapshot,
};
