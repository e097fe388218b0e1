//! Experiment descriptors
//!
//! An [`ExperimentDescriptor`] is the raw, user-supplied record of what to
//! break. It is deliberately untyped where user input is untyped (kind and
//! fault names, free-form parameters) so that validation can be reported as a
//! [`Rejection`] instead of being impossible to express. [`ExperimentDescriptor::validate`]
//! turns it into a typed [`Experiment`], which is what the engine acts on.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::FaultAction;
use crate::error::Rejection;

/// Namespace used when none is given
pub const DEFAULT_NAMESPACE: &str = "default";

/// Parameter holding the number of pods to act on
pub const PARAM_NUM_PODS: &str = "num_pods";

/// Workload kinds whose pod selector can be resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// apps/v1 Deployment
    Deployment,
}

impl TargetKind {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" | "deployments" | "deploy" => Ok(Self::Deployment),
            _ => Err(Rejection::UnsupportedKind {
                kind: s.to_string(),
            }),
        }
    }
}

/// Supported faults
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultKind {
    /// Delete pods outright
    PodDeletion,
    /// Evict pods through the eviction API, honouring disruption budgets
    PodEviction,
    /// Delete pods so their controller restarts them
    PodRestart,
}

impl FaultKind {
    /// All supported faults, in display order
    pub const ALL: [FaultKind; 3] = [Self::PodDeletion, Self::PodEviction, Self::PodRestart];

    /// Canonical kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PodDeletion => "pod-deletion",
            Self::PodEviction => "pod-eviction",
            Self::PodRestart => "pod-restart",
        }
    }

    /// The per-pod action this fault applies
    pub fn action(&self) -> FaultAction {
        match self {
            Self::PodDeletion => FaultAction::Delete,
            Self::PodEviction => FaultAction::Evict,
            Self::PodRestart => FaultAction::Restart,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultKind {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Rejection::UnsupportedFault {
                fault: s.to_string(),
            })
    }
}

/// A `kind/name` reference to a workload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetRef {
    /// Workload kind as written by the user
    pub kind: String,
    /// Workload name
    pub name: String,
}

impl FromStr for TargetRef {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Rejection::MalformedTarget {
            target: s.to_string(),
        };
        let (kind, name) = s.split_once('/').ok_or_else(malformed)?;
        if kind.is_empty() || name.is_empty() || name.contains('/') {
            return Err(malformed());
        }
        Ok(Self {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Raw experiment configuration, constructed once per invocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentDescriptor {
    /// Workload kind (e.g. "deployment")
    pub target_kind: String,
    /// Workload name
    pub target_name: String,
    /// Namespace of the workload
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Fault to inject (e.g. "pod-deletion")
    pub fault_kind: String,
    /// Fault parameters; only `num_pods` is recognised
    #[serde(default)]
    pub fault_params: BTreeMap<String, serde_json::Value>,
    /// Free-text description of the experiment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl ExperimentDescriptor {
    /// Create a descriptor in the default namespace with no parameters
    pub fn new(target: TargetRef, fault_kind: impl Into<String>) -> Self {
        Self {
            target_kind: target.kind,
            target_name: target.name,
            namespace: default_namespace(),
            fault_kind: fault_kind.into(),
            fault_params: BTreeMap::new(),
            description: None,
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set a fault parameter
    pub fn with_param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fault_params.insert(name.into(), value);
        self
    }

    /// Set the number of pods to act on
    pub fn with_num_pods(self, num_pods: i64) -> Self {
        self.with_param(PARAM_NUM_PODS, serde_json::Value::from(num_pods))
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate the descriptor into a typed experiment.
    ///
    /// The fault kind is checked first so that an unsupported fault is always
    /// reported as such, regardless of what else is wrong.
    pub fn validate(&self) -> Result<Experiment, Rejection> {
        let fault = self.fault_kind.parse::<FaultKind>()?;

        if self.target_name.trim().is_empty() {
            return Err(Rejection::EmptyTargetName);
        }
        let target_kind = self.target_kind.parse::<TargetKind>()?;

        let mut num_pods = 1;
        for (name, value) in &self.fault_params {
            match name.as_str() {
                PARAM_NUM_PODS => num_pods = parse_num_pods(value)?,
                other => {
                    return Err(Rejection::invalid_parameter(
                        other,
                        "unknown parameter (supported: num_pods)",
                    ))
                }
            }
        }

        let namespace = if self.namespace.is_empty() {
            default_namespace()
        } else {
            self.namespace.clone()
        };

        Ok(Experiment {
            target_kind,
            target_name: self.target_name.clone(),
            namespace,
            fault,
            num_pods,
            description: self.description.clone(),
        })
    }
}

fn parse_num_pods(value: &serde_json::Value) -> Result<usize, Rejection> {
    if let Some(n) = value.as_u64() {
        if n >= 1 {
            return usize::try_from(n)
                .map_err(|_| Rejection::invalid_parameter(PARAM_NUM_PODS, "value is too large"));
        }
    }
    if value.is_i64() || value.is_u64() {
        return Err(Rejection::invalid_parameter(
            PARAM_NUM_PODS,
            format!("must be at least 1, got {}", value),
        ));
    }
    Err(Rejection::invalid_parameter(
        PARAM_NUM_PODS,
        format!("must be a positive integer, got {}", value),
    ))
}

/// A validated experiment
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    /// Workload kind
    pub target_kind: TargetKind,
    /// Workload name
    pub target_name: String,
    /// Namespace of the workload
    pub namespace: String,
    /// Fault to inject
    pub fault: FaultKind,
    /// Number of pods to act on, at least 1
    pub num_pods: usize,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Experiment {
    /// `kind/name` of the target workload
    pub fn target(&self) -> String {
        format!("{}/{}", self.target_kind, self.target_name)
    }
}
