//! Diff computation between declared and remote state

use crate::types::{Classification, ResourceClass, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Classification of every declared key of one class, plus its stale set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    /// Resource class this diff describes
    pub class: ResourceClass,
    /// Declared key → action, enumerated in ascending key order
    pub entries: BTreeMap<String, Classification>,
    /// Remote keys absent from the declared state
    pub stale: BTreeSet<String>,
}

impl Diff {
    /// Keys that apply mode must upsert
    pub fn pending(&self) -> impl Iterator<Item = (&str, Classification)> {
        self.entries
            .iter()
            .filter(|(_, c)| c.needs_write())
            .map(|(name, c)| (name.as_str(), *c))
    }

    pub fn classification(&self, name: &str) -> Option<Classification> {
        self.entries.get(name).copied()
    }
}

/// Compute the diff for one resource class
///
/// Values are compared with exact string equality. A class that is not
/// comparable never yields `Unchanged`: anything present remotely is
/// `UpdateUnknown`.
pub fn diff(class: ResourceClass, declared: &Snapshot, remote: &Snapshot) -> Diff {
    let comparable = class.comparable();

    let entries = declared
        .iter()
        .map(|(name, want)| {
            let classification = match remote.get(name) {
                None => Classification::Create,
                Some(have) => classify_present(comparable, want.as_deref(), have.as_deref()),
            };
            (name.clone(), classification)
        })
        .collect();

    Diff {
        class,
        entries,
        stale: stale(declared, remote),
    }
}

fn classify_present(comparable: bool, want: Option<&str>, have: Option<&str>) -> Classification {
    match (comparable, want, have) {
        (true, Some(want), Some(have)) if want == have => Classification::Unchanged,
        (true, Some(_), Some(_)) => Classification::Update,
        // A missing value on either side means equality can't be established
        _ => Classification::UpdateUnknown,
    }
}

/// Remote keys that are not declared: `remote − declared`
///
/// Case-sensitive, no normalization.
pub fn stale(declared: &Snapshot, remote: &Snapshot) -> BTreeSet<String> {
    remote
        .keys()
        .filter(|name| !declared.contains_key(*name))
        .cloned()
        .collect()
}
