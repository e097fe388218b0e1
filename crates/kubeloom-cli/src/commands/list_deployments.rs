//! `kubeloom list-deployments` - list deployments in a namespace

use clap::Args;

use kubeloom_core::WorkloadSummary;

use crate::config::KubeloomConfig;
use crate::{ClusterArgs, Result};

use super::format::{format_age, print_table};
use super::{connect, OutputFormat};

/// List deployments that can be targeted
#[derive(Args, Debug)]
pub struct ListDeploymentsArgs {
    /// Kubernetes namespace to list
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub output: OutputFormat,
}

pub async fn run(
    args: ListDeploymentsArgs,
    cluster_args: &ClusterArgs,
    config: &KubeloomConfig,
) -> Result<()> {
    let namespace = config.namespace(args.namespace.as_deref());
    let cluster = connect(cluster_args, config).await?;

    let deployments = cluster
        .list_workloads(&namespace)
        .await
        .map_err(|e| crate::Error::command_failed(format!("failed to list deployments: {}", e)))?;

    match args.output {
        OutputFormat::Table => {
            if deployments.is_empty() {
                println!("No deployments found in namespace {}.", namespace);
                return Ok(());
            }
            print_table(
                &["NAME", "REPLICAS", "AVAILABLE", "READY", "AGE"],
                &deployment_rows(&deployments),
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deployments)?),
    }

    Ok(())
}

fn deployment_rows(deployments: &[WorkloadSummary]) -> Vec<Vec<String>> {
    deployments
        .iter()
        .map(|d| {
            vec![
                d.name.clone(),
                d.replicas.to_string(),
                d.available_replicas.to_string(),
                d.ready_replicas.to_string(),
                d.created
                    .as_ref()
                    .map(format_age)
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_show_replica_counts() {
        let rows = deployment_rows(&[WorkloadSummary {
            name: "checkout".to_string(),
            replicas: 3,
            available_replicas: 2,
            ready_replicas: 1,
            created: None,
        }]);
        assert_eq!(rows, vec![vec!["checkout", "3", "2", "1", "-"]]);
    }
}
