//! Control operations composed from the resolver, store, monitor and
//! controller. The HTTP layer in [`crate::api`] is a thin shell around this.

use crate::config::Config;
use crate::controller::ProcessController;
use crate::error::ControlError;
use crate::monitor::{ProcessMonitor, UNKNOWN_VERSION};
use crate::paths::PathSet;
use crate::process::ProcessHost;
use crate::store::{self, ConfigMap};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const CONFIG_UPDATED: &str = "Config updated successfully";

/// Point-in-time view of the supervised process
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub version: String,
    /// Never computed
    pub connections: u64,
    /// Never computed
    pub proxies: Vec<serde_json::Value>,
    pub paths: PathSet,
}

/// `{success, message}` body returned by start, stop and config updates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(err: &ControlError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
        }
    }
}

/// Body of `GET /api/config`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /api/config`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ConfigUpdate {
    /// Strings are taken verbatim; any other JSON value is written as its
    /// JSON text (`7001`, `true`).
    fn into_config_map(self) -> Option<ConfigMap> {
        let entries = self.config.filter(|entries| !entries.is_empty())?;
        Some(
            entries
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect(),
        )
    }
}

pub struct ControlService {
    paths: PathSet,
    monitor: Arc<ProcessMonitor>,
    controller: Arc<ProcessController>,
    /// Serializes start, stop and config writes
    transitions: Arc<Mutex<()>>,
}

impl ControlService {
    pub fn new(paths: PathSet, monitor: Arc<ProcessMonitor>, config_flag: impl Into<String>) -> Self {
        let controller = ProcessController::new(Arc::clone(&monitor), config_flag);
        Self {
            paths,
            monitor,
            controller: Arc::new(controller),
            transitions: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(config: &Config, paths: PathSet, host: Arc<dyn ProcessHost>) -> Self {
        let monitor = Arc::new(ProcessMonitor::new(host, &config.discovery, &config.process));
        Self::new(paths, monitor, config.process.config_flag.clone())
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    /// Fresh status. The version is only probed while frps is running.
    pub async fn status(&self) -> StatusSnapshot {
        // Scanning the process table blocks
        let running = tokio::task::spawn_blocking({
            let monitor = Arc::clone(&self.monitor);
            move || monitor.is_running()
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Process table scan did not complete");
            false
        });

        let version = match (&self.paths.executable, running) {
            (Some(executable), true) => self.monitor.probe_version(executable).await,
            _ => UNKNOWN_VERSION.to_string(),
        };

        StatusSnapshot {
            running,
            version,
            connections: 0,
            proxies: Vec::new(),
            paths: self.paths.clone(),
        }
    }

    pub async fn start(&self) -> Result<&'static str, ControlError> {
        let result = tokio::task::spawn_blocking({
            let controller = Arc::clone(&self.controller);
            let transitions = Arc::clone(&self.transitions);
            let paths = self.paths.clone();
            move || {
                let _guard = transitions.lock();
                controller.start(&paths)
            }
        })
        .await
        .unwrap_or_else(|e| Err(ControlError::Task(e.to_string())));

        result.map_err(|e| {
            warn!(error = %e, "Start request failed");
            e
        })
    }

    pub async fn stop(&self) -> Result<&'static str, ControlError> {
        let result = tokio::task::spawn_blocking({
            let controller = Arc::clone(&self.controller);
            let transitions = Arc::clone(&self.transitions);
            move || {
                let _guard = transitions.lock();
                controller.stop()
            }
        })
        .await
        .unwrap_or_else(|e| Err(ControlError::Task(e.to_string())));

        result.map_err(|e| {
            warn!(error = %e, "Stop request failed");
            e
        })
    }

    /// Current frps config. Every read failure, including an unresolved
    /// path, is reported as [`ControlError::ConfigUnavailable`].
    pub fn config(&self) -> Result<ConfigMap, ControlError> {
        let path = self
            .paths
            .config
            .as_deref()
            .ok_or(ControlError::ConfigUnavailable)?;
        store::read_or_absent(path).ok_or(ControlError::ConfigUnavailable)
    }

    pub async fn update_config(&self, update: ConfigUpdate) -> Result<&'static str, ControlError> {
        let config = update.into_config_map().ok_or(ControlError::EmptyConfig)?;
        let path = self
            .paths
            .config
            .clone()
            .ok_or(ControlError::ConfigPathUnknown)?;

        let transitions = Arc::clone(&self.transitions);
        tokio::task::spawn_blocking(move || -> Result<&'static str, ControlError> {
            let _guard = transitions.lock();
            store::write(&path, &config).map_err(|e| {
                warn!(path = %path.display(), error = %e, "Failed to update frps config");
                ControlError::from(e)
            })?;

            info!(path = %path.display(), entries = config.len(), "Updated frps config");
            Ok(CONFIG_UPDATED)
        })
        .await
        .unwrap_or_else(|e| Err(ControlError::Task(e.to_string())))
    }
}
