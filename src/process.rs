use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use sysinfo::System;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Windows process creation flag that suppresses the console window
#[cfg(windows)]
pub const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Outcome of a kill-by-name sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KillReport {
    /// Processes that matched one of the names
    pub matched: usize,
    /// Processes the OS accepted a kill request for
    pub killed: usize,
}

impl KillReport {
    /// Matches existed but not a single one could be terminated
    pub fn all_failed(&self) -> bool {
        self.matched > 0 && self.killed == 0
    }
}

/// The OS process facilities the supervisor relies on.
///
/// Matching is by exact, case-sensitive process name; paths and arguments
/// are never consulted.
pub trait ProcessHost: Send + Sync {
    /// Names of every process currently in the OS process table
    fn process_names(&self) -> Vec<String>;

    /// Forcibly terminate every process whose name is in `names`.
    /// No graceful signal is sent and exit is not awaited.
    fn kill_matching(&self, names: &[String]) -> KillReport;

    /// Launch `program` without a window and without tracking the child.
    /// Returns the child's pid when the OS reports one.
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> std::io::Result<Option<u32>>;
}

/// [`ProcessHost`] backed by the real process table
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessHost;

impl SystemProcessHost {
    fn snapshot() -> System {
        let mut system = System::new();
        system.refresh_processes();
        system
    }
}

impl ProcessHost for SystemProcessHost {
    fn process_names(&self) -> Vec<String> {
        Self::snapshot()
            .processes()
            .values()
            .map(|process| process.name().to_string())
            .collect()
    }

    fn kill_matching(&self, names: &[String]) -> KillReport {
        let system = Self::snapshot();
        let mut report = KillReport::default();

        for (pid, process) in system.processes() {
            if !names.iter().any(|name| name == process.name()) {
                continue;
            }
            report.matched += 1;
            if process.kill() {
                info!(pid = pid.as_u32(), name = process.name(), "Killed process");
                report.killed += 1;
            } else {
                warn!(pid = pid.as_u32(), name = process.name(), "Failed to kill process");
            }
        }

        report
    }

    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> std::io::Result<Option<u32>> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        // Dropping the handle leaves the child running; tokio reaps it
        // in the background once it exits.
        let child = cmd.spawn()?;
        let pid = child.id();
        debug!(program = %program.display(), ?pid, "Spawned detached process");
        Ok(pid)
    }
}
