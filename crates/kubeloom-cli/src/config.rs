//! Kubeloom CLI configuration stored at `~/.kubeloom/`.
//!
//! `~/.kubeloom/config.json` holds optional defaults for flags that are
//! tedious to repeat. A missing file means all defaults.
//!
//! The kubeconfig resolution chain (highest priority first):
//! 1. Explicit `--kubeconfig` flag
//! 2. `KUBELOOM_KUBECONFIG` environment variable
//! 3. Fall back to kube default (`KUBECONFIG` env / `~/.kube/config`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use kubeloom_core::DEFAULT_NAMESPACE;

use crate::{Error, Result};

const CONFIG_DIR_NAME: &str = ".kubeloom";
const CONFIG_FILE_NAME: &str = "config.json";
const KUBELOOM_KUBECONFIG_ENV: &str = "KUBELOOM_KUBECONFIG";

/// Timeout applied to every API request when none is configured
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Persistent CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KubeloomConfig {
    /// Namespace used when `--namespace` is not given.
    pub default_namespace: Option<String>,
    /// Connect/read/write timeout for API requests, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Default number of concurrent per-pod actions.
    pub parallelism: Option<usize>,
}

impl KubeloomConfig {
    /// Namespace to use when none was given on the command line
    pub fn namespace(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| self.default_namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }

    /// Timeout for API requests
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

/// Path to `~/.kubeloom/config.json`.
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::command_failed("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load config from `~/.kubeloom/config.json`, returning default if missing.
pub fn load_config() -> Result<KubeloomConfig> {
    load_config_from(&config_path()?)
}

/// Load config from `path`, returning default if missing.
pub fn load_config_from(path: &Path) -> Result<KubeloomConfig> {
    if !path.exists() {
        return Ok(KubeloomConfig::default());
    }
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::command_failed(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&data)
        .map_err(|e| Error::command_failed(format!("failed to parse {}: {}", path.display(), e)))
}

/// Resolve a kubeconfig path using the priority chain.
///
/// Returns `Some(path)` if a kubeconfig is found, `None` to use kube defaults.
pub fn resolve_kubeconfig(explicit: Option<&str>) -> Option<String> {
    if let Some(path) = explicit {
        return Some(path.to_string());
    }

    match std::env::var(KUBELOOM_KUBECONFIG_ENV) {
        Ok(path) if !path.is_empty() => Some(path),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, KubeloomConfig::default());
        assert_eq!(config.namespace(None), "default");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn reads_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"defaultNamespace": "staging", "requestTimeoutSecs": 5, "parallelism": 3}"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.namespace(None), "staging");
        assert_eq!(config.namespace(Some("prod")), "prod");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.parallelism, Some(3));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn resolve_kubeconfig_explicit_wins() {
        let result = resolve_kubeconfig(Some("/explicit/path"));
        assert_eq!(result.as_deref(), Some("/explicit/path"));
    }
}
