use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for the control service itself (not the supervised frps config)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Where and how to look for the frps install
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// How the frps executable is invoked
    #[serde(default)]
    pub process: ProcessConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// HTTP port (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Replaces the built-in install directories when non-empty
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,

    /// Searched after the built-in (or replaced) directories
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,

    /// Accepted config file names, in priority order
    #[serde(default = "default_config_names")]
    pub config_names: Vec<String>,

    /// Accepted executable names, in priority order. Also used to match
    /// running processes.
    #[serde(default = "default_executable_names")]
    pub executable_names: Vec<String>,

    /// Log file name placed next to the discovered install
    #[serde(default = "default_log_name")]
    pub log_name: String,

    /// Consult the OS install registry (Windows only)
    #[serde(default = "default_use_registry")]
    pub use_registry: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            extra_dirs: Vec::new(),
            config_names: default_config_names(),
            executable_names: default_executable_names(),
            log_name: default_log_name(),
            use_registry: default_use_registry(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessConfig {
    /// Flag that makes frps print its version
    #[serde(default = "default_version_flag")]
    pub version_flag: String,

    /// Flag that precedes the config path when starting frps
    #[serde(default = "default_config_flag")]
    pub config_flag: String,

    /// Upper bound for the version probe
    #[serde(default = "default_version_timeout")]
    pub version_timeout_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            version_flag: default_version_flag(),
            config_flag: default_config_flag(),
            version_timeout_secs: default_version_timeout(),
        }
    }
}

impl ProcessConfig {
    pub fn version_timeout(&self) -> Duration {
        Duration::from_secs(self.version_timeout_secs)
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_config_names() -> Vec<String> {
    vec![
        "frps.ini".to_string(),
        "frps.toml".to_string(),
        "frps.json".to_string(),
    ]
}

fn default_executable_names() -> Vec<String> {
    vec!["frps.exe".to_string(), "frps".to_string()]
}

fn default_log_name() -> String {
    "frps.log".to_string()
}

fn default_use_registry() -> bool {
    true
}

fn default_version_flag() -> String {
    "-v".to_string()
}

fn default_config_flag() -> String {
    "-c".to_string()
}

fn default_version_timeout() -> u64 {
    5
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise `frpsctl.toml` when it exists,
    /// otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate all configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be greater than 0".to_string());
        }
        if self.discovery.config_names.is_empty() {
            errors.push("discovery.config_names must not be empty".to_string());
        }
        if self.discovery.executable_names.is_empty() {
            errors.push("discovery.executable_names must not be empty".to_string());
        }
        if self.discovery.log_name.trim().is_empty() {
            errors.push("discovery.log_name must not be empty".to_string());
        }
        if self.process.version_timeout_secs == 0 {
            errors.push("process.version_timeout_secs must be greater than 0".to_string());
        }

        if !errors.is_empty() {
            anyhow::bail!("Configuration errors:\n  - {}", errors.join("\n  - "));
        }

        Ok(())
    }
}

/// Settings file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "frpsctl.toml";
