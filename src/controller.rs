//! Starting and stopping the supervised frps process.
//!
//! The controller never remembers whether it started anything: each call
//! re-reads the OS process table through the [`ProcessMonitor`].

use crate::error::ControlError;
use crate::monitor::ProcessMonitor;
use crate::paths::PathSet;
use std::ffi::OsString;
use std::sync::Arc;
use tracing::{info, warn};

pub const STARTED: &str = "FRPS started successfully";
pub const STOPPED: &str = "FRPS stopped successfully";

pub struct ProcessController {
    monitor: Arc<ProcessMonitor>,
    config_flag: String,
}

impl ProcessController {
    pub fn new(monitor: Arc<ProcessMonitor>, config_flag: impl Into<String>) -> Self {
        Self {
            monitor,
            config_flag: config_flag.into(),
        }
    }

    /// Launch `<executable> <config_flag> <config>` detached. Nothing is
    /// spawned when frps is already running or either path is missing.
    pub fn start(&self, paths: &PathSet) -> Result<&'static str, ControlError> {
        if self.monitor.is_running() {
            return Err(ControlError::AlreadyRunning);
        }

        let (Some(executable), Some(config)) = (&paths.executable, &paths.config) else {
            return Err(ControlError::NotConfigured);
        };

        let args = [OsString::from(&self.config_flag), config.as_os_str().to_owned()];
        let pid = self
            .monitor
            .host()
            .spawn_detached(executable, &args)
            .map_err(ControlError::Spawn)?;

        info!(
            executable = %executable.display(),
            config = %config.display(),
            ?pid,
            "Started frps"
        );
        Ok(STARTED)
    }

    /// Force-kill every process carrying a target name. Fails only when
    /// frps is not running or no matching process could be killed.
    pub fn stop(&self) -> Result<&'static str, ControlError> {
        if !self.monitor.is_running() {
            return Err(ControlError::NotRunning);
        }

        let report = self.monitor.host().kill_matching(self.monitor.names());
        if report.all_failed() {
            return Err(ControlError::Terminate(format!(
                "none of {} matching processes could be terminated",
                report.matched
            )));
        }
        if report.killed < report.matched {
            warn!(
                matched = report.matched,
                killed = report.killed,
                "Some frps processes could not be terminated"
            );
        }

        info!(killed = report.killed, "Stopped frps");
        Ok(STOPPED)
    }
}
