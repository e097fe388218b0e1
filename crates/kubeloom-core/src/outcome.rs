//! Outcome records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::action::{FailureDetail, FaultAction};
use crate::experiment::FaultKind;
use crate::selector::{Selector, UnitRef};

/// Result of one action on one pod
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "failure", rename_all = "lowercase")]
pub enum UnitStatus {
    /// The cluster accepted the action
    Succeeded,
    /// The action was rejected or timed out
    Failed(FailureDetail),
}

/// One entry of an outcome record
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    /// The pod acted on
    pub pod: UnitRef,
    /// What was done to it
    pub action: FaultAction,
    /// How it went
    #[serde(flatten)]
    pub status: UnitStatus,
}

impl UnitOutcome {
    /// Returns true if the action succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.status, UnitStatus::Succeeded)
    }

    /// The failure detail, if the action failed
    pub fn failure(&self) -> Option<&FailureDetail> {
        match &self.status {
            UnitStatus::Succeeded => None,
            UnitStatus::Failed(detail) => Some(detail),
        }
    }
}

/// Overall classification of a batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Every attempted pod succeeded
    AllSucceeded,
    /// Some pods succeeded and some failed
    PartialFailure,
    /// Every attempted pod failed
    TotalFailure,
}

impl Classification {
    /// Classify a non-empty batch of outcomes
    pub fn of(entries: &[UnitOutcome]) -> Self {
        let succeeded = entries.iter().filter(|e| e.is_success()).count();
        if succeeded == entries.len() {
            Self::AllSucceeded
        } else if succeeded == 0 {
            Self::TotalFailure
        } else {
            Self::PartialFailure
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllSucceeded => f.write_str("AllSucceeded"),
            Self::PartialFailure => f.write_str("PartialFailure"),
            Self::TotalFailure => f.write_str("TotalFailure"),
        }
    }
}

/// Aggregated result of one fault-injection call
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    /// `kind/name` of the target workload
    pub target: String,
    /// Namespace of the target
    pub namespace: String,
    /// Fault that was injected
    pub fault: FaultKind,
    /// Selector the pods were listed by
    pub selector: Selector,
    /// Number of pods requested
    pub requested: usize,
    /// When sampling started
    pub started_at: DateTime<Utc>,
    /// When the last action returned
    pub finished_at: DateTime<Utc>,
    /// Per-pod results, in sampling order
    pub entries: Vec<UnitOutcome>,
    /// Overall classification
    pub classification: Classification,
}

impl OutcomeRecord {
    /// Entries whose action succeeded
    pub fn succeeded(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.entries.iter().filter(|e| e.is_success())
    }

    /// Entries whose action failed
    pub fn failed(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.entries.iter().filter(|e| !e.is_success())
    }

    /// Returns true if every pod was acted on
    pub fn is_success(&self) -> bool {
        self.classification == Classification::AllSucceeded
    }
}
