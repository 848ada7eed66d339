//! Liveness and version checks for the supervised frps process.

use crate::config::{DiscoveryConfig, ProcessConfig};
use crate::process::ProcessHost;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Reported when the version cannot be determined
pub const UNKNOWN_VERSION: &str = "Unknown";

pub struct ProcessMonitor {
    host: Arc<dyn ProcessHost>,
    names: Vec<String>,
    version_flag: String,
    version_timeout: Duration,
}

impl ProcessMonitor {
    pub fn new(host: Arc<dyn ProcessHost>, discovery: &DiscoveryConfig, process: &ProcessConfig) -> Self {
        Self {
            host,
            names: discovery.executable_names.clone(),
            version_flag: process.version_flag.clone(),
            version_timeout: process.version_timeout(),
        }
    }

    /// Process names that count as the target
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn host(&self) -> &Arc<dyn ProcessHost> {
        &self.host
    }

    /// Whether any process in the OS table carries one of the target names.
    /// Scans the table synchronously; async callers go through
    /// `spawn_blocking`.
    pub fn is_running(&self) -> bool {
        let running = self
            .host
            .process_names()
            .iter()
            .any(|name| self.names.iter().any(|target| target == name));
        debug!(running, "Checked frps liveness");
        running
    }

    pub async fn probe_version(&self, executable: &Path) -> String {
        probe_version(executable, &self.version_flag, self.version_timeout).await
    }
}

/// Run `<executable> <flag>` and return its trimmed stdout, or
/// [`UNKNOWN_VERSION`] on spawn failure, non-zero exit or timeout.
pub async fn probe_version(executable: &Path, flag: &str, timeout: Duration) -> String {
    let mut cmd = Command::new(executable);
    cmd.arg(flag);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    #[cfg(windows)]
    cmd.creation_flags(crate::process::CREATE_NO_WINDOW);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(executable = %executable.display(), error = %e, "Failed to run version probe");
            return UNKNOWN_VERSION.to_string();
        }
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        Ok(Ok(output)) => {
            debug!(executable = %executable.display(), status = ?output.status, "Version probe exited unsuccessfully");
            UNKNOWN_VERSION.to_string()
        }
        Ok(Err(e)) => {
            warn!(executable = %executable.display(), error = %e, "Version probe failed");
            UNKNOWN_VERSION.to_string()
        }
        Err(_) => {
            warn!(
                executable = %executable.display(),
                timeout_ms = timeout.as_millis() as u64,
                "Version probe timed out"
            );
            UNKNOWN_VERSION.to_string()
        }
    }
}
