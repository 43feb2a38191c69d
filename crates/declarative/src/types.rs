//! Core types for organization state reconciliation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name → observed value for one resource class.
///
/// `None` means the entry is known to exist but its value cannot be read
/// (secrets). Ordered so every enumeration is stable.
pub type Snapshot = BTreeMap<String, Option<String>>;

/// The two independently reconciled resource classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    /// Plain configuration variables, readable and comparable
    Variables,
    /// Secrets, write-only: only presence is observable
    Secrets,
}

impl ResourceClass {
    /// Both classes, in processing order
    pub const ALL: [ResourceClass; 2] = [ResourceClass::Variables, ResourceClass::Secrets];

    /// Whether remote values of this class can be compared to declared ones
    pub fn comparable(&self) -> bool {
        matches!(self, Self::Variables)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Variables => "variables",
            Self::Secrets => "secrets",
        }
    }

    /// Singular noun for report lines
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Variables => "variable",
            Self::Secrets => "secret",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a run may mutate remote state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Report what would happen, issue no mutating calls
    DryRun,
    /// Issue upsert/delete calls
    Apply,
}

impl Mode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Apply }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => f.write_str("dry-run"),
            Self::Apply => f.write_str("apply"),
        }
    }
}

/// Per-key result of comparing declared and remote state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Declared, absent remotely
    Create,
    /// Declared, present remotely with a different value
    Update,
    /// Declared, present remotely with an equal value
    Unchanged,
    /// Declared, present remotely, value not observable
    UpdateUnknown,
}

impl Classification {
    /// Whether apply mode issues an upsert for this key
    pub fn needs_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Default number of concurrent remote calls per class
pub const DEFAULT_JOBS: usize = 4;

/// Default maximum number of stale entries a cleanup may delete per class
pub const DEFAULT_DELETION_THRESHOLD: usize = 5;

/// Tunables for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Worker pool size for per-key remote calls
    pub jobs: usize,
    /// Stale-set size above which cleanup refuses to delete anything
    pub deletion_threshold: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            deletion_threshold: DEFAULT_DELETION_THRESHOLD,
        }
    }
}
