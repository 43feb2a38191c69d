//! Report model for sync and cleanup runs
//!
//! Reports are the only output of the engine. Records are always sorted by
//! key so that two runs over identical inputs serialize identically.

use crate::types::{Classification, Mode, ResourceClass};
use serde::Serialize;
use std::fmt;

/// Which pass produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Create/update declared keys
    Sync,
    /// Delete undeclared keys
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Cleanup => f.write_str("cleanup"),
        }
    }
}

/// Action taken (or that would be taken) for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Unchanged,
    UpdateUnknown,
    Delete,
}

impl From<Classification> for Action {
    fn from(c: Classification) -> Self {
        match c {
            Classification::Create => Self::Create,
            Classification::Update => Self::Update,
            Classification::Unchanged => Self::Unchanged,
            Classification::UpdateUnknown => Self::UpdateUnknown,
        }
    }
}

impl Action {
    /// Phrase for a dry-run report line
    pub fn planned_phrase(&self) -> &'static str {
        match self {
            Self::Create => "would create",
            Self::Update => "would update",
            Self::Unchanged => "unchanged",
            Self::UpdateUnknown => "would update (value not comparable)",
            Self::Delete => "would delete",
        }
    }

    /// Phrase for an applied report line
    pub fn applied_phrase(&self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Unchanged => "unchanged",
            Self::UpdateUnknown => "updated (value not comparable)",
            Self::Delete => "deleted",
        }
    }
}

/// What happened to a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum KeyResult {
    /// Dry run: the action would be taken
    Planned,
    /// Remote call succeeded
    Applied,
    /// No remote call needed
    Skipped,
    /// Listed in an aborted cleanup, not deleted
    Refused,
    /// Remote call failed
    Failed { error: String },
}

impl KeyResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One line of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRecord {
    pub name: String,
    pub action: Action,
    #[serde(flatten)]
    pub result: KeyResult,
}

impl KeyRecord {
    pub fn new(name: impl Into<String>, action: Action, result: KeyResult) -> Self {
        Self {
            name: name.into(),
            action,
            result,
        }
    }
}

/// Class-level result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassStatus {
    /// Every key succeeded (or was planned/skipped)
    Completed,
    /// At least one key failed; the others were still processed
    Failed { failed: Vec<String> },
    /// Cleanup refused by the safety gate
    Aborted { count: usize, threshold: usize },
    /// The class could not be processed at all (snapshot or setup failure)
    Unavailable { error: String },
}

/// Report for one resource class in one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassReport {
    pub class: ResourceClass,
    pub phase: Phase,
    pub mode: Mode,
    #[serde(flatten)]
    pub status: ClassStatus,
    pub records: Vec<KeyRecord>,
}

impl ClassReport {
    /// Build a report from per-key records, deriving the status
    pub fn from_records(
        class: ResourceClass,
        phase: Phase,
        mode: Mode,
        mut records: Vec<KeyRecord>,
    ) -> Self {
        records.sort_by(|a, b| a.name.cmp(&b.name));
        let failed: Vec<String> = records
            .iter()
            .filter(|r| r.result.is_failure())
            .map(|r| r.name.clone())
            .collect();
        let status = if failed.is_empty() {
            ClassStatus::Completed
        } else {
            ClassStatus::Failed { failed }
        };
        Self {
            class,
            phase,
            mode,
            status,
            records,
        }
    }

    /// A class that could not be processed
    pub fn unavailable(class: ResourceClass, phase: Phase, mode: Mode, error: String) -> Self {
        Self {
            class,
            phase,
            mode,
            status: ClassStatus::Unavailable { error },
            records: Vec::new(),
        }
    }

    /// Keys whose remote call failed
    pub fn failed_keys(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.result.is_failure())
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ClassStatus::Completed)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.status, ClassStatus::Aborted { .. })
    }

    /// Number of records with the given action whose call succeeded or was planned
    pub fn count(&self, action: Action) -> usize {
        self.records
            .iter()
            .filter(|r| r.action == action && !r.result.is_failure())
            .count()
    }
}

/// Overall run result, used for the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failed,
    Aborted,
}

/// Report for a whole run (all selected classes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub organization: String,
    pub phase: Phase,
    pub mode: Mode,
    pub classes: Vec<ClassReport>,
}

impl RunReport {
    pub fn new(organization: impl Into<String>, phase: Phase, mode: Mode) -> Self {
        Self {
            organization: organization.into(),
            phase,
            mode,
            classes: Vec::new(),
        }
    }

    pub fn class(&self, class: ResourceClass) -> Option<&ClassReport> {
        self.classes.iter().find(|r| r.class == class)
    }

    /// Aborted dominates failed, which dominates success
    pub fn outcome(&self) -> RunOutcome {
        self.classes
            .iter()
            .map(|r| match r.status {
                ClassStatus::Completed => RunOutcome::Success,
                ClassStatus::Failed { .. } | ClassStatus::Unavailable { .. } => {
                    RunOutcome::Failed
                }
                ClassStatus::Aborted { .. } => RunOutcome::Aborted,
            })
            .max()
            .unwrap_or(RunOutcome::Success)
    }
}
