//! Discovery of the frps install.
//!
//! Resolution runs once at startup and produces a [`PathSet`] that is handed
//! to every component needing it. Finding nothing is not an error: absent
//! entries mean "unconfigured" and surface later as not-found responses.

use crate::config::DiscoveryConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Registry key holding the installer's chosen directory (under HKLM)
pub const REGISTRY_KEY: &str = r"SOFTWARE\frp";
/// Value name under [`REGISTRY_KEY`]
pub const REGISTRY_VALUE: &str = "InstallPath";

/// Resolved locations of the frps install
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathSet {
    /// frps configuration file
    pub config: Option<PathBuf>,
    /// frps executable
    pub executable: Option<PathBuf>,
    /// Log file next to the install (may not exist yet)
    pub log: Option<PathBuf>,
}

impl PathSet {
    /// Both the executable and the config were found
    pub fn is_complete(&self) -> bool {
        self.config.is_some() && self.executable.is_some()
    }
}

/// Source of an installer-recorded install directory
pub trait InstallRegistry: Send + Sync {
    fn install_path(&self) -> Option<PathBuf>;
}

/// The OS install registry. Only Windows has one; elsewhere the lookup
/// always comes back empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRegistry;

#[cfg(windows)]
impl InstallRegistry for SystemRegistry {
    fn install_path(&self) -> Option<PathBuf> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let key = RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey(REGISTRY_KEY)
            .ok()?;
        let value: String = key.get_value(REGISTRY_VALUE).ok()?;
        if value.trim().is_empty() {
            return None;
        }
        Some(PathBuf::from(value))
    }
}

#[cfg(not(windows))]
impl InstallRegistry for SystemRegistry {
    fn install_path(&self) -> Option<PathBuf> {
        None
    }
}

/// Registry that never has an entry
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRegistry;

impl InstallRegistry for NoRegistry {
    fn install_path(&self) -> Option<PathBuf> {
        None
    }
}

/// Well-known install directories for this platform, followed by `~/frp`
pub fn builtin_dirs() -> Vec<PathBuf> {
    #[cfg(windows)]
    let mut dirs: Vec<PathBuf> = [
        r"C:\Program Files\frp",
        r"C:\frp",
        r"C:\Program Files (x86)\frp",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();

    #[cfg(not(windows))]
    let mut dirs: Vec<PathBuf> = ["/opt/frp", "/usr/local/frp", "/etc/frp"]
        .iter()
        .map(PathBuf::from)
        .collect();

    if let Some(home) = dirs_next::home_dir() {
        dirs.push(home.join("frp"));
    }
    dirs
}

/// Ordered candidate directories: registry entry first, then the built-ins
/// (or the configured replacement list), then any extra directories.
pub fn candidate_dirs(discovery: &DiscoveryConfig, registry: &dyn InstallRegistry) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if discovery.use_registry {
        if let Some(install_path) = registry.install_path() {
            debug!(path = %install_path.display(), "Install path found in registry");
            dirs.push(install_path);
        }
    }

    if discovery.search_dirs.is_empty() {
        dirs.extend(builtin_dirs());
    } else {
        dirs.extend(discovery.search_dirs.iter().cloned());
    }
    dirs.extend(discovery.extra_dirs.iter().cloned());
    dirs
}

/// Resolve the frps install using the configured search order
pub fn resolve(discovery: &DiscoveryConfig, registry: &dyn InstallRegistry) -> PathSet {
    let dirs = candidate_dirs(discovery, registry);
    let paths = resolve_in(&dirs, discovery);

    info!(
        config = ?paths.config,
        executable = ?paths.executable,
        log = ?paths.log,
        searched = dirs.len(),
        "Resolved frps paths"
    );
    paths
}

/// Search `dirs` in order. Later directories may fill in whatever earlier
/// ones lacked; the search stops once both config and executable are known.
pub fn resolve_in(dirs: &[PathBuf], discovery: &DiscoveryConfig) -> PathSet {
    let mut paths = PathSet::default();

    for dir in dirs {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Candidate directory does not exist");
            continue;
        }

        if let Some(config) = first_existing(dir, &discovery.config_names) {
            paths.config = Some(config);
        }
        if let Some(executable) = first_existing(dir, &discovery.executable_names) {
            paths.executable = Some(executable);
        }
        paths.log = Some(dir.join(&discovery.log_name));

        if paths.is_complete() {
            debug!(dir = %dir.display(), "Found complete frps install");
            break;
        }
    }

    paths
}

fn first_existing(dir: &Path, names: &[String]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FixedRegistry(PathBuf);

    impl InstallRegistry for FixedRegistry {
        fn install_path(&self) -> Option<PathBuf> {
            Some(self.0.clone())
        }
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    fn subdir(root: &TempDir, name: &str) -> PathBuf {
        let dir = root.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolves_complete_install() {
        let root = tempfile::tempdir().unwrap();
        let frp = subdir(&root, "frp");
        touch(&frp, "frps.toml");
        touch(&frp, "frps.exe");

        let paths = resolve_in(&[frp.clone()], &DiscoveryConfig::default());

        assert_eq!(paths.config, Some(frp.join("frps.toml")));
        assert_eq!(paths.executable, Some(frp.join("frps.exe")));
        assert_eq!(paths.log, Some(frp.join("frps.log")));
    }

    #[test]
    fn test_nothing_found_leaves_everything_absent() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");

        let paths = resolve_in(&[missing], &DiscoveryConfig::default());

        assert_eq!(paths, PathSet::default());
        assert!(!paths.is_complete());
    }

    #[test]
    fn test_incomplete_directories_do_not_stop_search() {
        let root = tempfile::tempdir().unwrap();
        let empty = subdir(&root, "empty");
        let complete = subdir(&root, "complete");
        touch(&complete, "frps.ini");
        touch(&complete, "frps");

        let paths = resolve_in(&[empty, complete.clone()], &DiscoveryConfig::default());

        assert_eq!(paths.config, Some(complete.join("frps.ini")));
        assert_eq!(paths.executable, Some(complete.join("frps")));
        assert_eq!(paths.log, Some(complete.join("frps.log")));
    }

    #[test]
    fn test_first_complete_directory_wins() {
        let root = tempfile::tempdir().unwrap();
        let first = subdir(&root, "first");
        let second = subdir(&root, "second");
        for dir in [&first, &second] {
            touch(dir, "frps.toml");
            touch(dir, "frps");
        }

        let paths = resolve_in(&[first.clone(), second], &DiscoveryConfig::default());

        assert_eq!(paths.config, Some(first.join("frps.toml")));
        assert_eq!(paths.executable, Some(first.join("frps")));
        assert_eq!(paths.log, Some(first.join("frps.log")));
    }

    #[test]
    fn test_findings_combine_across_directories() {
        let root = tempfile::tempdir().unwrap();
        let config_only = subdir(&root, "config-only");
        let exe_only = subdir(&root, "exe-only");
        touch(&config_only, "frps.json");
        touch(&exe_only, "frps");

        let paths = resolve_in(
            &[config_only.clone(), exe_only.clone()],
            &DiscoveryConfig::default(),
        );

        assert_eq!(paths.config, Some(config_only.join("frps.json")));
        assert_eq!(paths.executable, Some(exe_only.join("frps")));
        assert_eq!(paths.log, Some(exe_only.join("frps.log")));
    }

    #[test]
    fn test_log_follows_last_inspected_directory() {
        let root = tempfile::tempdir().unwrap();
        let a = subdir(&root, "a");
        let b = subdir(&root, "b");
        touch(&a, "frps.ini");

        let paths = resolve_in(&[a.clone(), b.clone()], &DiscoveryConfig::default());

        assert_eq!(paths.config, Some(a.join("frps.ini")));
        assert_eq!(paths.executable, None);
        assert_eq!(paths.log, Some(b.join("frps.log")));
    }

    #[test]
    fn test_config_name_priority() {
        let root = tempfile::tempdir().unwrap();
        let frp = subdir(&root, "frp");
        touch(&frp, "frps.json");
        touch(&frp, "frps.ini");
        touch(&frp, "frps.exe");
        touch(&frp, "frps");

        let paths = resolve_in(&[frp.clone()], &DiscoveryConfig::default());

        assert_eq!(paths.config, Some(frp.join("frps.ini")));
        assert_eq!(paths.executable, Some(frp.join("frps.exe")));
    }

    #[test]
    fn test_directories_are_not_mistaken_for_files() {
        let root = tempfile::tempdir().unwrap();
        let frp = subdir(&root, "frp");
        fs::create_dir(frp.join("frps.toml")).unwrap();
        touch(&frp, "frps");

        let paths = resolve_in(&[frp.clone()], &DiscoveryConfig::default());

        assert_eq!(paths.config, None);
        assert_eq!(paths.executable, Some(frp.join("frps")));
    }

    #[test]
    fn test_registry_path_is_searched_first() {
        let root = tempfile::tempdir().unwrap();
        let installed = subdir(&root, "installed");
        let configured = subdir(&root, "configured");
        for dir in [&installed, &configured] {
            touch(dir, "frps.toml");
            touch(dir, "frps");
        }

        let discovery = DiscoveryConfig {
            search_dirs: vec![configured],
            ..DiscoveryConfig::default()
        };
        let paths = resolve(&discovery, &FixedRegistry(installed.clone()));

        assert_eq!(paths.config, Some(installed.join("frps.toml")));
    }

    #[test]
    fn test_registry_can_be_disabled() {
        let discovery = DiscoveryConfig {
            search_dirs: vec![PathBuf::from("/srv/frp")],
            use_registry: false,
            ..DiscoveryConfig::default()
        };

        let dirs = candidate_dirs(&discovery, &FixedRegistry(PathBuf::from("/installed")));
        assert_eq!(dirs, vec![PathBuf::from("/srv/frp")]);
    }

    #[test]
    fn test_candidate_order() {
        let discovery = DiscoveryConfig {
            extra_dirs: vec![PathBuf::from("/data/frp")],
            ..DiscoveryConfig::default()
        };

        let dirs = candidate_dirs(&discovery, &FixedRegistry(PathBuf::from("/installed")));

        assert_eq!(dirs.first(), Some(&PathBuf::from("/installed")));
        assert_eq!(dirs.last(), Some(&PathBuf::from("/data/frp")));
        assert_eq!(dirs.len(), builtin_dirs().len() + 2);
    }

    #[test]
    fn test_no_registry_adds_nothing() {
        let discovery = DiscoveryConfig {
            search_dirs: vec![PathBuf::from("/srv/frp")],
            ..DiscoveryConfig::default()
        };

        let dirs = candidate_dirs(&discovery, &NoRegistry);
        assert_eq!(dirs, vec![PathBuf::from("/srv/frp")]);
    }

    #[cfg(windows)]
    #[test]
    fn test_builtin_dirs_windows() {
        let dirs = builtin_dirs();
        assert_eq!(dirs[0], PathBuf::from(r"C:\Program Files\frp"));
        assert_eq!(dirs[1], PathBuf::from(r"C:\frp"));
        assert_eq!(dirs[2], PathBuf::from(r"C:\Program Files (x86)\frp"));
    }

    #[test]
    fn test_path_set_serializes_absent_as_null() {
        let paths = PathSet {
            config: Some(PathBuf::from("frps.toml")),
            executable: None,
            log: None,
        };
        let json = serde_json::to_value(&paths).unwrap();

        assert_eq!(json["config"], "frps.toml");
        assert!(json["executable"].is_null());
        assert!(json["log"].is_null());
    }
}
