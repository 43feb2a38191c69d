//! Capability traits consumed by the engine
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific remote API client, secret source or UI.

use crate::report::{KeyRecord, Phase};
use crate::types::{ResourceClass, Snapshot};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Organization-scoped remote key-value store
///
/// Implement this trait over the real API client. Every call may block on
/// network I/O; the engine calls it from worker threads. An `Err` from a
/// mutating call is recorded against the key and never retried here.
pub trait RemoteStore: Send + Sync {
    /// Current variables with their values
    fn list_variables(&self) -> Result<BTreeMap<String, String>>;

    /// Names of current secrets
    fn list_secret_names(&self) -> Result<BTreeSet<String>>;

    /// Create or update a variable
    fn upsert_variable(&self, name: &str, value: &str) -> Result<()>;

    /// Create or update a secret
    fn upsert_secret(&self, name: &str, value: &str) -> Result<()>;

    /// Delete a variable
    fn delete_variable(&self, name: &str) -> Result<()>;

    /// Delete a secret
    fn delete_secret(&self, name: &str) -> Result<()>;

    /// Read a snapshot of one class
    fn snapshot(&self, class: ResourceClass) -> Result<Snapshot> {
        Ok(match class {
            ResourceClass::Variables => self
                .list_variables()?
                .into_iter()
                .map(|(name, value)| (name, Some(value)))
                .collect(),
            ResourceClass::Secrets => self
                .list_secret_names()?
                .into_iter()
                .map(|name| (name, None))
                .collect(),
        })
    }

    /// Upsert dispatched by class
    fn upsert(&self, class: ResourceClass, name: &str, value: &str) -> Result<()> {
        match class {
            ResourceClass::Variables => self.upsert_variable(name, value),
            ResourceClass::Secrets => self.upsert_secret(name, value),
        }
    }

    /// Delete dispatched by class
    fn delete(&self, class: ResourceClass, name: &str) -> Result<()> {
        match class {
            ResourceClass::Variables => self.delete_variable(name),
            ResourceClass::Secrets => self.delete_secret(name),
        }
    }
}

/// Resolves the value to write for a declared key
///
/// Only consulted in apply mode, from the worker that performs the upsert.
pub trait ValueSource: Send + Sync {
    fn value_for(&self, name: &str) -> Result<String>;
}

impl ValueSource for BTreeMap<String, String> {
    fn value_for(&self, name: &str) -> Result<String> {
        self.get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no declared value for '{name}'"))
    }
}

/// Progress callback for reconcile and cleanup passes
///
/// Methods take `&self` because per-key completions are reported from
/// worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called when a pass over `count` keys starts
    fn on_class_start(&self, class: ResourceClass, phase: Phase, count: usize);

    /// Called when a key's remote call completes
    fn on_key_complete(&self, class: ResourceClass, record: &KeyRecord);

    /// Called when the pass completes
    fn on_class_complete(&self, class: ResourceClass);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_class_start(&self, _class: ResourceClass, _phase: Phase, _count: usize) {}
    fn on_key_complete(&self, _class: ResourceClass, _record: &KeyRecord) {}
    fn on_class_complete(&self, _class: ResourceClass) {}
}
