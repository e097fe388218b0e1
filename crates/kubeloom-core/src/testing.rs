//! In-memory cluster for engine tests

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cluster::{ClusterApi, ClusterError, MutationMode};
use crate::experiment::TargetKind;
use crate::selector::{Selector, UnitRef};

struct FakePod {
    unit: UnitRef,
    labels: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    deployments: BTreeMap<(String, String), Selector>,
    /// Insertion order is listing order
    pods: Vec<FakePod>,
    failures: BTreeMap<String, ClusterError>,
    mutations: Vec<(String, MutationMode)>,
}

/// Deployments and pods held in memory.
///
/// Successful mutations remove the pod. Pods registered with
/// [`FakeCluster::fail_pod`] reject every mutation with the given error.
#[derive(Default)]
pub(crate) struct FakeCluster {
    state: Mutex<State>,
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_deployment(&self, namespace: &str, name: &str, match_labels: &[(&str, &str)]) {
        self.state.lock().deployments.insert(
            (namespace.to_string(), name.to_string()),
            Selector::from_labels(labels(match_labels)),
        );
    }

    pub(crate) fn add_pod(&self, namespace: &str, name: &str, pod_labels: &[(&str, &str)]) {
        self.state.lock().pods.push(FakePod {
            unit: UnitRef::new(namespace, name),
            labels: labels(pod_labels),
        });
    }

    pub(crate) fn fail_pod(&self, name: &str, err: ClusterError) {
        self.state.lock().failures.insert(name.to_string(), err);
    }

    pub(crate) fn mutations(&self) -> Vec<(String, MutationMode)> {
        self.state.lock().mutations.clone()
    }

    pub(crate) fn has_pod(&self, namespace: &str, name: &str) -> bool {
        self.state
            .lock()
            .pods
            .iter()
            .any(|p| p.unit.namespace == namespace && p.unit.name == name)
    }

    pub(crate) fn pod_count(&self, namespace: &str) -> usize {
        self.state
            .lock()
            .pods
            .iter()
            .filter(|p| p.unit.namespace == namespace)
            .count()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn workload_selector(
        &self,
        namespace: &str,
        _kind: TargetKind,
        name: &str,
    ) -> Result<Option<Selector>, ClusterError> {
        Ok(self
            .state
            .lock()
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn list_units(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<UnitRef>, ClusterError> {
        Ok(self
            .state
            .lock()
            .pods
            .iter()
            .filter(|p| p.unit.namespace == namespace && selector.matches(&p.labels))
            .map(|p| p.unit.clone())
            .collect())
    }

    async fn mutate_unit(
        &self,
        namespace: &str,
        name: &str,
        mode: MutationMode,
    ) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        state.mutations.push((name.to_string(), mode));

        if let Some(err) = state.failures.get(name) {
            return Err(err.clone());
        }

        let before = state.pods.len();
        state
            .pods
            .retain(|p| !(p.unit.namespace == namespace && p.unit.name == name));
        if state.pods.len() == before {
            return Err(ClusterError::api(
                404,
                "NotFound",
                format!("pods \"{}\" not found", name),
            ));
        }
        Ok(())
    }
}
