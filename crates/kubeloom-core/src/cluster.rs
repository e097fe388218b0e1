//! Cluster capability
//!
//! The engine only ever talks to the cluster through [`ClusterApi`]: resolve a
//! workload's selector, list pods by selector, and mutate a single pod. The
//! trait is mocked in tests and implemented against a real API server by
//! [`KubeCluster`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, EvictParams, ListParams};
use kube::Client;
use serde::Serialize;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::experiment::TargetKind;
use crate::selector::{Selector, UnitRef};

/// HTTP status returned by the eviction API when a disruption budget blocks the eviction
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// How a pod is removed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationMode {
    /// Unconditional delete
    Delete,
    /// Eviction subresource, subject to PodDisruptionBudgets
    Evict,
}

impl fmt::Display for MutationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => f.write_str("delete"),
            Self::Evict => f.write_str("evict"),
        }
    }
}

/// Error reported by the cluster capability
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterError {
    /// HTTP status code, if the API server answered at all
    pub code: Option<u16>,
    /// Machine-readable reason (e.g. "NotFound", "Forbidden")
    pub reason: String,
    /// Human-readable message
    pub message: String,
}

impl ClusterError {
    /// An API server rejection with a status code
    pub fn api(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// A failure to reach the API server
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: "Transport".to_string(),
            message: message.into(),
        }
    }

    /// Returns true if the resource did not exist
    pub fn is_not_found(&self) -> bool {
        self.code == Some(404)
    }
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} ({}): {}", self.reason, code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ClusterError {}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) => Self::api(ae.code, ae.reason, ae.message),
            other => Self::transport(other.to_string()),
        }
    }
}

/// Operations the engine needs from the cluster.
///
/// Implementations must be safe for concurrent use; the engine may issue
/// several `mutate_unit` calls at once.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Get the match-labels of a workload, or `None` if it does not exist
    async fn workload_selector(
        &self,
        namespace: &str,
        kind: TargetKind,
        name: &str,
    ) -> Result<Option<Selector>, ClusterError>;

    /// List pods matching a selector
    async fn list_units(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<UnitRef>, ClusterError>;

    /// Delete or evict a single pod
    async fn mutate_unit(
        &self,
        namespace: &str,
        name: &str,
        mode: MutationMode,
    ) -> Result<(), ClusterError>;
}

/// Summary of a deployment for read-only listings
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSummary {
    /// Deployment name
    pub name: String,
    /// Desired replicas
    pub replicas: i32,
    /// Available replicas
    pub available_replicas: i32,
    /// Ready replicas
    pub ready_replicas: i32,
    /// Creation time
    pub created: Option<DateTime<Utc>>,
}

/// Summary of a pod for read-only listings
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSummary {
    /// Pod name
    pub name: String,
    /// Lifecycle phase (Pending, Running, ...)
    pub phase: Option<String>,
    /// Pod IP
    pub ip: Option<String>,
    /// Node the pod is scheduled on
    pub node: Option<String>,
}

/// [`ClusterApi`] backed by a kube-rs client.
///
/// Request timeouts come from the client's `Config`.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// List deployments in a namespace
    pub async fn list_workloads(&self, namespace: &str) -> Result<Vec<WorkloadSummary>, ClusterError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployments = api.list(&ListParams::default()).await?;

        Ok(deployments
            .items
            .into_iter()
            .map(|dep| {
                let spec_replicas = dep.spec.as_ref().and_then(|s| s.replicas);
                let status = dep.status.unwrap_or_default();
                WorkloadSummary {
                    name: dep.metadata.name.unwrap_or_default(),
                    replicas: spec_replicas.unwrap_or(1),
                    available_replicas: status.available_replicas.unwrap_or(0),
                    ready_replicas: status.ready_replicas.unwrap_or(0),
                    created: dep.metadata.creation_timestamp.map(|t| t.0),
                }
            })
            .collect())
    }

    /// List pods matching a selector with their phase and placement
    pub async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<PodSummary>, ClusterError> {
        let pods = self.pods(namespace).list(&list_params(selector)).await?;

        Ok(pods
            .items
            .into_iter()
            .map(|pod| {
                let status = pod.status.unwrap_or_default();
                PodSummary {
                    name: pod.metadata.name.unwrap_or_default(),
                    phase: status.phase,
                    ip: status.pod_ip,
                    node: pod.spec.and_then(|s| s.node_name),
                }
            })
            .collect())
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn list_params(selector: &Selector) -> ListParams {
    ListParams::default().labels(&selector.to_string())
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn workload_selector(
        &self,
        namespace: &str,
        kind: TargetKind,
        name: &str,
    ) -> Result<Option<Selector>, ClusterError> {
        match kind {
            TargetKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                let Some(deployment) = api.get_opt(name).await? else {
                    return Ok(None);
                };
                let labels = deployment
                    .spec
                    .and_then(|spec| spec.selector.match_labels)
                    .unwrap_or_default();
                Ok(Some(Selector::from_labels(labels)))
            }
        }
    }

    async fn list_units(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<UnitRef>, ClusterError> {
        let pods = self.pods(namespace).list(&list_params(selector)).await?;
        debug!(namespace = %namespace, selector = %selector, count = pods.items.len(), "listed pods");

        Ok(pods
            .items
            .into_iter()
            .filter_map(|pod| pod.metadata.name)
            .map(|name| UnitRef::new(namespace, name))
            .collect())
    }

    async fn mutate_unit(
        &self,
        namespace: &str,
        name: &str,
        mode: MutationMode,
    ) -> Result<(), ClusterError> {
        let api = self.pods(namespace);
        match mode {
            MutationMode::Delete => {
                api.delete(name, &DeleteParams::default()).await?;
            }
            MutationMode::Evict => {
                api.evict(name, &EvictParams::default()).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    #[test]
    fn api_errors_keep_code_and_reason() {
        let err: ClusterError = kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "pods \"web-1\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        })
        .into();

        assert_eq!(err.code, Some(404));
        assert_eq!(err.reason, "NotFound");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "NotFound (404): pods \"web-1\" not found");
    }

    #[test]
    fn transport_errors_have_no_code() {
        let err = ClusterError::transport("connection refused");
        assert_eq!(err.code, None);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn list_params_use_rendered_selector() {
        let selector = Selector::default()
            .with_label("app", "checkout")
            .with_label("tier", "web");
        let params = list_params(&selector);
        assert_eq!(params.label_selector.as_deref(), Some("app=checkout,tier=web"));
    }

    #[test]
    fn mutation_mode_display() {
        assert_eq!(MutationMode::Delete.to_string(), "delete");
        assert_eq!(MutationMode::Evict.to_string(), "evict");
    }
}
