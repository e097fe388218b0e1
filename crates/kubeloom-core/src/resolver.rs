//! Workload to selector resolution

use std::sync::Arc;

use tracing::debug;

use crate::cluster::ClusterApi;
use crate::error::{Error, Rejection, Result};
use crate::experiment::TargetKind;
use crate::selector::Selector;

/// Resolves a named workload to the label selector of its pods
pub struct TargetResolver {
    cluster: Arc<dyn ClusterApi>,
}

impl TargetResolver {
    /// Create a resolver over the given cluster
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self { cluster }
    }

    /// Look up `kind/name` in `namespace` and return its pod selector.
    ///
    /// Read-only. Fails with `UnsupportedKind` before any cluster call if the
    /// kind cannot be introspected, and with `EmptySelector` if the workload
    /// has no match-labels.
    pub async fn resolve(&self, namespace: &str, kind: &str, name: &str) -> Result<Selector> {
        let target_kind = kind.parse::<TargetKind>()?;
        self.resolve_kind(namespace, target_kind, name).await
    }

    pub(crate) async fn resolve_kind(
        &self,
        namespace: &str,
        kind: TargetKind,
        name: &str,
    ) -> Result<Selector> {
        let selector = self
            .cluster
            .workload_selector(namespace, kind, name)
            .await
            .map_err(|e| Error::transport(format!("get {}", kind), e.to_string()))?
            .ok_or_else(|| Error::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            })?;

        if selector.is_empty() {
            return Err(Rejection::EmptySelector {
                kind: kind.to_string(),
                name: name.to_string(),
            }
            .into());
        }

        debug!(namespace = %namespace, kind = %kind, name = %name, selector = %selector, "resolved target");
        Ok(selector)
    }
}
