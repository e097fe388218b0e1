//! `kubeloom list-pods` - list the pods a target workload selects

use std::sync::Arc;

use clap::Args;

use kubeloom_core::{PodSummary, TargetRef, TargetResolver};

use crate::config::KubeloomConfig;
use crate::{ClusterArgs, Error, Result};

use super::format::{or_dash, print_table};
use super::{connect, OutputFormat};

/// List the pods an experiment against a target would choose from
#[derive(Args, Debug)]
pub struct ListPodsArgs {
    /// Target workload (e.g. deployment/my-app)
    pub target: String,

    /// Kubernetes namespace of the target
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub output: OutputFormat,
}

pub async fn run(args: ListPodsArgs, cluster_args: &ClusterArgs, config: &KubeloomConfig) -> Result<()> {
    let target: TargetRef = args.target.parse()?;
    let namespace = config.namespace(args.namespace.as_deref());
    let cluster = connect(cluster_args, config).await?;

    let selector = TargetResolver::new(Arc::new(cluster.clone()))
        .resolve(&namespace, &target.kind, &target.name)
        .await?;
    let pods = cluster
        .list_pods(&namespace, &selector)
        .await
        .map_err(|e| Error::command_failed(format!("failed to list pods: {}", e)))?;

    match args.output {
        OutputFormat::Table => {
            if pods.is_empty() {
                println!("No pods match {} in namespace {}.", selector, namespace);
                return Ok(());
            }
            print_table(&["NAME", "PHASE", "IP", "NODE"], &pod_rows(&pods));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pods)?),
    }

    Ok(())
}

fn pod_rows(pods: &[PodSummary]) -> Vec<Vec<String>> {
    pods.iter()
        .map(|p| {
            vec![
                p.name.clone(),
                or_dash(p.phase.as_deref()),
                or_dash(p.ip.as_deref()),
                or_dash(p.node.as_deref()),
            ]
        })
        .collect()
}
