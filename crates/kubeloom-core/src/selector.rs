//! Label selectors and pod references

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label-equality selector derived from a workload's match-labels.
///
/// Keys are held in a `BTreeMap`, so the rendered form is sorted by key and
/// identical for identical label sets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector {
    labels: BTreeMap<String, String>,
}

impl Selector {
    /// Build a selector from match-labels
    pub fn from_labels(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// Add an equality constraint
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns true if the selector has no constraints
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The equality constraints
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Returns true if every constraint is satisfied by `labels`
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.labels
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }
}

impl fmt::Display for Selector {
    /// Renders the `key1=value1,key2=value2` form used by list calls
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.labels {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}={}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

/// Reference to a single pod.
///
/// This is a transient pointer into cluster state: the pod may be gone by the
/// time anything acts on it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitRef {
    /// Pod name, unique within its namespace
    pub name: String,
    /// Pod namespace
    pub namespace: String,
}

impl UnitRef {
    /// Create a new pod reference
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
