//! Error types for the fault-injection engine
//!
//! Errors fall into two groups. Everything in [`Rejection`] is raised before
//! any cluster call that could mutate state, so a rejected experiment never
//! causes partial damage. The remaining variants of [`Error`] describe
//! failures while establishing *what* to act on (resolution and listing).
//! Per-pod failures during the act phase are never errors; they are recorded
//! as [`crate::FailureDetail`] entries in the outcome record.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level engine error
#[derive(Debug, Error)]
pub enum Error {
    /// The experiment was refused before any mutation was attempted
    #[error("experiment rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The named workload does not exist in the namespace
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        /// Workload kind (e.g. "deployment")
        kind: String,
        /// Workload name
        name: String,
        /// Namespace that was searched
        namespace: String,
    },

    /// The selector matched zero pods, nothing was attempted
    #[error("no pods found matching selector '{selector}' in namespace '{namespace}'")]
    NoCandidates {
        /// Namespace that was listed
        namespace: String,
        /// Rendered label selector
        selector: String,
    },

    /// A read call against the cluster failed, so no candidates could be established
    #[error("cluster error during {operation}: {message}")]
    Transport {
        /// Operation that failed (e.g. "list pods")
        operation: String,
        /// Underlying error message
        message: String,
    },
}

impl Error {
    /// Create a transport error for the given operation
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if the experiment was refused during validation
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Reasons an experiment is refused before touching the cluster
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    /// The target kind cannot be introspected for a pod selector
    #[error("unsupported target kind '{kind}' (supported: deployment)")]
    UnsupportedKind {
        /// Kind as given by the user
        kind: String,
    },

    /// The fault kind is not a member of the supported set
    #[error("unsupported fault '{fault}' (supported: pod-deletion, pod-eviction, pod-restart)")]
    UnsupportedFault {
        /// Fault kind as given by the user
        fault: String,
    },

    /// A target reference did not have the form `kind/name`
    #[error("malformed target '{target}', expected <kind>/<name>")]
    MalformedTarget {
        /// Target reference as given by the user
        target: String,
    },

    /// A fault parameter was unknown or out of range
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// What is wrong with it
        message: String,
    },

    /// The target name was empty
    #[error("target name must not be empty")]
    EmptyTargetName,

    /// The workload has no match-labels, which would select every pod in the namespace
    #[error("{kind} '{name}' has no match labels to select pods by")]
    EmptySelector {
        /// Workload kind
        kind: String,
        /// Workload name
        name: String,
    },
}

impl Rejection {
    /// Create an invalid parameter rejection
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_converts_into_error() {
        let err: Error = Rejection::EmptyTargetName.into();
        assert!(err.is_rejected());
        assert_eq!(
            err.to_string(),
            "experiment rejected: target name must not be empty"
        );
    }

    #[test]
    fn not_found_message_names_the_workload() {
        let err = Error::NotFound {
            kind: "deployment".to_string(),
            name: "checkout".to_string(),
            namespace: "prod".to_string(),
        };
        assert!(!err.is_rejected());
        assert_eq!(
            err.to_string(),
            "deployment 'checkout' not found in namespace 'prod'"
        );
    }

    #[test]
    fn transport_error_includes_operation() {
        let err = Error::transport("list pods", "connection refused");
        assert_eq!(
            err.to_string(),
            "cluster error during list pods: connection refused"
        );
    }
}
