//! Kubeloom fault-injection engine
//!
//! Selects pods belonging to a workload, applies a disruptive action to a
//! random subset of them, and reports per-pod results:
//!
//! - [`TargetResolver`] turns `kind/name` into the workload's pod selector
//! - [`CandidateSampler`] lists matching pods and draws a random subset
//! - [`FaultAction`] deletes, evicts, or restarts a single pod
//! - [`FaultEngine`] ties them together and classifies the [`OutcomeRecord`]
//!
//! All cluster access goes through the [`ClusterApi`] trait.

pub mod action;
pub mod cluster;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod outcome;
pub mod resolver;
pub mod sampler;
pub mod selector;

#[cfg(test)]
mod testing;

pub use action::{FailureDetail, FailureReason, FaultAction};
pub use cluster::{ClusterApi, ClusterError, KubeCluster, MutationMode, PodSummary, WorkloadSummary};
pub use engine::{EngineConfig, FaultEngine, DEFAULT_ACTION_TIMEOUT};
pub use error::{Error, Rejection, Result};
pub use experiment::{
    Experiment, ExperimentDescriptor, FaultKind, TargetKind, TargetRef, DEFAULT_NAMESPACE,
    PARAM_NUM_PODS,
};
pub use outcome::{Classification, OutcomeRecord, UnitOutcome, UnitStatus};
pub use resolver::TargetResolver;
pub use sampler::CandidateSampler;
pub use selector::{Selector, UnitRef};
