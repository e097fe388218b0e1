//! Per-pod fault actions
//!
//! Each action issues exactly one mutating call for one pod. Nothing here
//! retries; a rejected or timed-out call becomes a [`FailureDetail`] for that
//! pod and the caller moves on to the next one.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::cluster::{ClusterApi, ClusterError, MutationMode, STATUS_TOO_MANY_REQUESTS};
use crate::selector::UnitRef;

/// Disruptive operation applied to a single pod
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultAction {
    /// Delete the pod
    Delete,
    /// Evict the pod
    Evict,
    /// Delete the pod, reported as a restart
    Restart,
}

impl FaultAction {
    /// The cluster call this action maps to
    pub fn mode(&self) -> MutationMode {
        match self {
            Self::Delete | Self::Restart => MutationMode::Delete,
            Self::Evict => MutationMode::Evict,
        }
    }

    /// Lowercase name used in logs and output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Evict => "evict",
            Self::Restart => "restart",
        }
    }

    /// Apply the action to one pod.
    ///
    /// The call is bounded by `timeout`; exceeding it yields a
    /// [`FailureReason::Timeout`] failure.
    pub async fn apply(
        &self,
        cluster: &dyn ClusterApi,
        unit: &UnitRef,
        timeout: Duration,
    ) -> Result<(), FailureDetail> {
        let call = cluster.mutate_unit(&unit.namespace, &unit.name, self.mode());

        let result = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FailureDetail::from_cluster_error(*self, &e)),
            Err(_) => Err(FailureDetail::new(
                FailureReason::Timeout,
                format!("no response within {}s", timeout.as_secs_f64()),
            )),
        };

        match &result {
            Ok(()) => info!(pod = %unit, action = self.as_str(), "fault applied"),
            Err(detail) => warn!(
                pod = %unit,
                action = self.as_str(),
                reason = %detail.reason,
                error = %detail.message,
                "fault failed"
            ),
        }

        result
    }
}

impl fmt::Display for FaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a per-pod action failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// The pod no longer existed when the action ran
    NotFound,
    /// The caller is not allowed to perform the action
    Forbidden,
    /// The eviction would violate a PodDisruptionBudget
    DisruptionBudget,
    /// The pod was modified concurrently
    Conflict,
    /// The API server was unreachable, throttling, or failing
    Unavailable,
    /// The call did not complete within the action timeout
    Timeout,
    /// Any other rejection from the API server
    Rejected,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "NotFound",
            Self::Forbidden => "Forbidden",
            Self::DisruptionBudget => "DisruptionBudget",
            Self::Conflict => "Conflict",
            Self::Unavailable => "Unavailable",
            Self::Timeout => "Timeout",
            Self::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// Failure of a single per-pod action
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    /// Classified cause
    pub reason: FailureReason,
    /// Message from the cluster or the engine
    pub message: String,
}

impl FailureDetail {
    /// Create a failure detail
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// Classify a cluster error raised by `action`
    pub fn from_cluster_error(action: FaultAction, err: &ClusterError) -> Self {
        let reason = match err.code {
            Some(404) => FailureReason::NotFound,
            Some(401) | Some(403) => FailureReason::Forbidden,
            Some(409) => FailureReason::Conflict,
            Some(STATUS_TOO_MANY_REQUESTS) if action == FaultAction::Evict => {
                FailureReason::DisruptionBudget
            }
            Some(STATUS_TOO_MANY_REQUESTS) => FailureReason::Unavailable,
            Some(code) if code >= 500 => FailureReason::Unavailable,
            Some(_) => FailureReason::Rejected,
            None => FailureReason::Unavailable,
        };
        Self::new(reason, err.to_string())
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}
