//! Fault-injection engine
//!
//! Drives one experiment through `validate -> resolve -> sample -> act ->
//! classify`. Validation and resolution failures abort before any mutation.
//! Once pods have been sampled every one of them is attempted exactly once,
//! and each attempt produces one entry in the outcome record no matter how
//! its siblings fared.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, instrument, warn};

use crate::cluster::ClusterApi;
use crate::error::Result;
use crate::experiment::{Experiment, ExperimentDescriptor};
use crate::outcome::{Classification, OutcomeRecord, UnitOutcome, UnitStatus};
use crate::resolver::TargetResolver;
use crate::sampler::CandidateSampler;
use crate::selector::Selector;

/// Default bound on a single per-pod action
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Upper bound on each per-pod action
    pub action_timeout: Duration,
    /// Maximum number of per-pod actions in flight (1 = sequential)
    pub parallelism: usize,
    /// Seed for pod sampling; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            action_timeout: DEFAULT_ACTION_TIMEOUT,
            parallelism: 1,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Use a fixed sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Allow up to `parallelism` concurrent actions
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the per-pod action timeout
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }
}

/// Orchestrates resolution, sampling, and per-pod actions
pub struct FaultEngine {
    cluster: Arc<dyn ClusterApi>,
    resolver: TargetResolver,
    sampler: CandidateSampler,
    config: EngineConfig,
    rng: Mutex<StdRng>,
}

impl FaultEngine {
    /// Create an engine over the given cluster
    pub fn new(cluster: Arc<dyn ClusterApi>, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            resolver: TargetResolver::new(cluster.clone()),
            sampler: CandidateSampler::new(cluster.clone()),
            cluster,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Validate, resolve the target's selector, and inject the fault
    #[instrument(
        skip_all,
        fields(
            target = %format!("{}/{}", descriptor.target_kind, descriptor.target_name),
            namespace = %descriptor.namespace,
            fault = %descriptor.fault_kind,
        )
    )]
    pub async fn run_experiment(&self, descriptor: &ExperimentDescriptor) -> Result<OutcomeRecord> {
        let experiment = descriptor.validate()?;
        let selector = self
            .resolver
            .resolve_kind(
                &experiment.namespace,
                experiment.target_kind,
                &experiment.target_name,
            )
            .await?;
        self.inject_validated(&experiment, &selector).await
    }

    /// Inject the fault into pods matching an already-resolved selector.
    ///
    /// Only fails on validation, an empty candidate pool, or a failed listing.
    /// Per-pod failures are reported in the returned record.
    pub async fn inject(
        &self,
        descriptor: &ExperimentDescriptor,
        selector: &Selector,
    ) -> Result<OutcomeRecord> {
        let experiment = descriptor.validate()?;
        self.inject_validated(&experiment, selector).await
    }

    async fn inject_validated(
        &self,
        experiment: &Experiment,
        selector: &Selector,
    ) -> Result<OutcomeRecord> {
        let started_at = Utc::now();

        // Per-call rng so the engine lock is never held across an await
        let mut rng = StdRng::seed_from_u64(self.rng.lock().gen());
        let units = self
            .sampler
            .sample(&experiment.namespace, selector, experiment.num_pods, &mut rng)
            .await?;

        let action = experiment.fault.action();
        let timeout = self.config.action_timeout;
        let cluster = self.cluster.as_ref();

        info!(
            selector = %selector,
            requested = experiment.num_pods,
            sampled = units.len(),
            action = action.as_str(),
            "injecting fault"
        );

        let entries: Vec<UnitOutcome> = stream::iter(units)
            .map(|pod| async move {
                let status = match action.apply(cluster, &pod, timeout).await {
                    Ok(()) => UnitStatus::Succeeded,
                    Err(detail) => UnitStatus::Failed(detail),
                };
                UnitOutcome {
                    pod,
                    action,
                    status,
                }
            })
            .buffered(self.config.parallelism.max(1))
            .collect()
            .await;

        let classification = Classification::of(&entries);
        let failed = entries.iter().filter(|e| !e.is_success()).count();
        match classification {
            Classification::AllSucceeded => {
                info!(attempted = entries.len(), "fault injected into all sampled pods")
            }
            Classification::PartialFailure => warn!(
                attempted = entries.len(),
                failed, "fault injection partially failed"
            ),
            Classification::TotalFailure => {
                error!(attempted = entries.len(), "fault injection failed for every sampled pod")
            }
        }

        Ok(OutcomeRecord {
            target: experiment.target(),
            namespace: experiment.namespace.clone(),
            fault: experiment.fault,
            selector: selector.clone(),
            requested: experiment.num_pods,
            started_at,
            finished_at: Utc::now(),
            entries,
            classification,
        })
    }
}
