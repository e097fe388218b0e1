//! CLI commands

use std::fmt::Display;
use std::time::Duration;

use clap::ValueEnum;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use kubeloom_core::KubeCluster;

use crate::config::{resolve_kubeconfig, KubeloomConfig};
use crate::{ClusterArgs, Error, Result};

pub mod format;
pub mod list_deployments;
pub mod list_pods;
pub mod run_experiment;

/// Extension trait to convert errors with Display to CLI Error::CommandFailed.
pub trait CommandErrorExt<T> {
    /// Convert an error to `Error::CommandFailed` using its Display implementation.
    fn cmd_err(self) -> Result<T>;
}

impl<T, E: Display> CommandErrorExt<T> for std::result::Result<T, E> {
    fn cmd_err(self) -> Result<T> {
        self.map_err(|e| Error::command_failed(e.to_string()))
    }
}

/// Output format
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Columnar table (default)
    #[default]
    Table,
    /// JSON
    Json,
}

/// Build a kube [`Client`] using the kubeloom kubeconfig resolution chain.
///
/// Every request made through the client is bounded by `timeout`.
pub async fn kube_client(cluster: &ClusterArgs, timeout: Duration) -> Result<Client> {
    let options = KubeConfigOptions {
        context: cluster.context.clone(),
        ..Default::default()
    };

    let mut config = match resolve_kubeconfig(cluster.kubeconfig.as_deref()) {
        Some(path) => {
            debug!(kubeconfig = %path, "loading kubeconfig");
            let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| {
                Error::command_failed(format!("failed to read kubeconfig {}: {}", path, e))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .cmd_err()?
        }
        None if options.context.is_some() => Config::from_kubeconfig(&options).await.cmd_err()?,
        None => Config::infer().await.cmd_err()?,
    };

    config.connect_timeout = Some(timeout);
    config.read_timeout = Some(timeout);
    config.write_timeout = Some(timeout);

    Client::try_from(config).cmd_err()
}

/// Connect to the cluster selected by the global flags
pub async fn connect(cluster: &ClusterArgs, config: &KubeloomConfig) -> Result<KubeCluster> {
    let client = kube_client(cluster, config.request_timeout()).await?;
    Ok(KubeCluster::new(client))
}
