//! `kubeloom run-experiment` - inject a fault into a workload's pods

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::{info, warn};

use kubeloom_core::{
    Classification, EngineConfig, ExperimentDescriptor, FaultEngine, OutcomeRecord, TargetRef,
    UnitStatus,
};

use crate::config::KubeloomConfig;
use crate::{ClusterArgs, Result};

use super::format::print_table;
use super::{connect, OutputFormat};

/// Exit status when every sampled pod failed
pub const EXIT_TOTAL_FAILURE: u8 = 2;

/// Run a chaos experiment
#[derive(Args, Debug)]
pub struct RunExperimentArgs {
    /// Target workload (e.g. deployment/my-app)
    pub target: String,

    /// Kubernetes namespace of the target
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Fault to inject: pod-deletion, pod-eviction, or pod-restart
    #[arg(short, long)]
    pub fault: String,

    /// Number of pods to affect
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    pub pods: i64,

    /// Seed for pod selection, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum number of pods acted on concurrently
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Timeout for each per-pod action, in seconds
    #[arg(long, default_value_t = 30)]
    pub action_timeout: u64,

    /// Free-text description recorded with the experiment
    #[arg(long)]
    pub description: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub output: OutputFormat,
}

impl RunExperimentArgs {
    /// Build the experiment descriptor from the command line
    pub fn descriptor(&self, config: &KubeloomConfig) -> Result<ExperimentDescriptor> {
        let target: TargetRef = self.target.parse()?;
        let mut descriptor = ExperimentDescriptor::new(target, self.fault.clone())
            .with_namespace(config.namespace(self.namespace.as_deref()))
            .with_num_pods(self.pods);
        if let Some(description) = &self.description {
            descriptor = descriptor.with_description(description.clone());
        }
        Ok(descriptor)
    }

    /// Engine settings from flags, falling back to the config file
    pub fn engine_config(&self, config: &KubeloomConfig) -> EngineConfig {
        EngineConfig {
            action_timeout: Duration::from_secs(self.action_timeout),
            parallelism: self.parallelism.or(config.parallelism).unwrap_or(1),
            seed: self.seed,
        }
    }
}

pub async fn run(
    args: RunExperimentArgs,
    cluster_args: &ClusterArgs,
    config: &KubeloomConfig,
) -> Result<u8> {
    let descriptor = args.descriptor(config)?;

    // Reject before connecting so an invalid experiment never reaches the cluster
    descriptor.validate()?;
    info!(experiment = %serde_json::to_string(&descriptor)?, "starting experiment");

    let cluster = connect(cluster_args, config).await?;
    let engine = FaultEngine::new(Arc::new(cluster), args.engine_config(config));
    let record = engine.run_experiment(&descriptor).await?;

    match args.output {
        OutputFormat::Table => print_outcome(&record),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }

    if record.classification == Classification::PartialFailure {
        warn!(
            failed = record.failed().count(),
            attempted = record.entries.len(),
            "some pods could not be disrupted"
        );
    }

    Ok(exit_status(record.classification))
}

/// Process exit status for a classified outcome
pub fn exit_status(classification: Classification) -> u8 {
    match classification {
        Classification::AllSucceeded | Classification::PartialFailure => 0,
        Classification::TotalFailure => EXIT_TOTAL_FAILURE,
    }
}

fn outcome_rows(record: &OutcomeRecord) -> Vec<Vec<String>> {
    record
        .entries
        .iter()
        .map(|entry| {
            let (result, detail) = match &entry.status {
                UnitStatus::Succeeded => ("ok".to_string(), "-".to_string()),
                UnitStatus::Failed(detail) => {
                    ("failed".to_string(), format!("{}: {}", detail.reason, detail.message))
                }
            };
            vec![
                entry.pod.name.clone(),
                entry.action.to_string(),
                result,
                detail,
            ]
        })
        .collect()
}

fn print_outcome(record: &OutcomeRecord) {
    print_table(&["POD", "ACTION", "RESULT", "DETAIL"], &outcome_rows(record));
    println!();
    println!(
        "{} {} in {}: {} ({}/{} pods disrupted, {} requested)",
        record.fault,
        record.target,
        record.namespace,
        record.classification,
        record.succeeded().count(),
        record.entries.len(),
        record.requested,
    );
}
