//! Safety gate for destructive cleanup
//!
//! The gate looks at the whole stale set of one resource class at once and
//! decides, before any delete call is made, whether cleanup may proceed.
//! There is no override: a stale set larger than the threshold aborts the
//! class entirely.

use serde::Serialize;
use std::collections::BTreeSet;

/// Outcome of evaluating a stale set against the deletion threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetyDecision {
    /// Whether the full stale set may be deleted
    pub proceed: bool,
    /// Size of the stale set
    pub count: usize,
    /// Threshold it was evaluated against
    pub threshold: usize,
}

impl SafetyDecision {
    /// Cleanup refused for this class
    pub fn is_abort(&self) -> bool {
        !self.proceed
    }
}

/// Evaluate a stale set against a threshold
///
/// `count == threshold` proceeds; `count > threshold` aborts.
pub fn gate(stale: &BTreeSet<String>, threshold: usize) -> SafetyDecision {
    let count = stale.len();
    SafetyDecision {
        proceed: count <= threshold,
        count,
        threshold,
    }
}
