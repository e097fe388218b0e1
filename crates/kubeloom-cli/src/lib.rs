//! Kubeloom CLI library

pub mod commands;
pub mod config;
pub mod error;

pub use error::{Error, Result};

use clap::{Args, Parser, Subcommand};

/// Kubeloom - Kubernetes chaos engineering
#[derive(Parser, Debug)]
#[command(name = "kubeloom")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Flags selecting the cluster to talk to
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Path to kubeconfig file (default: $KUBELOOM_KUBECONFIG, $KUBECONFIG or ~/.kube/config)
    #[arg(short = 'k', long, global = true)]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all deployments in a namespace
    ListDeployments(commands::list_deployments::ListDeploymentsArgs),
    /// List the pods selected by a target workload
    ListPods(commands::list_pods::ListPodsArgs),
    /// Run a chaos experiment
    RunExperiment(commands::run_experiment::RunExperimentArgs),
}

impl Cli {
    /// Run the CLI command, returning the process exit status
    pub async fn run(self) -> Result<u8> {
        let config = config::load_config()?;
        match self.command {
            Commands::ListDeployments(args) => {
                commands::list_deployments::run(args, &self.cluster, &config).await?;
                Ok(0)
            }
            Commands::ListPods(args) => {
                commands::list_pods::run(args, &self.cluster, &config).await?;
                Ok(0)
            }
            Commands::RunExperiment(args) => {
                commands::run_experiment::run(args, &self.cluster, &config).await
            }
        }
    }
}
