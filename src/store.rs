//! Reading and writing the frps `key=value` configuration file.
//!
//! Comments (`#`) and blank lines are skipped on read and are not written
//! back, so a read/write cycle drops them. Keys are written in sorted order.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Parsed view of the frps config file
pub type ConfigMap = BTreeMap<String, String>;

const COMMENT_MARKER: char = '#';

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("config file is not valid UTF-8: {0}")]
    Parse(String),

    #[error("invalid config entry '{key}': {reason}")]
    InvalidEntry { key: String, reason: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse config text. Lines without `=` are ignored; for duplicate keys
/// the last occurrence wins.
pub fn parse(content: &str) -> ConfigMap {
    let mut map = ConfigMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    map
}

/// Render a map as one `key=value` line per entry
pub fn render(map: &ConfigMap) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

pub fn read(path: &Path) -> Result<ConfigMap, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path.display().to_string()),
        ErrorKind::InvalidData => StoreError::Parse(path.display().to_string()),
        _ => StoreError::Io(e),
    })?;

    let map = parse(&content);
    debug!(path = %path.display(), entries = map.len(), "Read frps config");
    Ok(map)
}

/// Like [`read`], but every failure collapses to `None`. The cause is logged.
pub fn read_or_absent(path: &Path) -> Option<ConfigMap> {
    match read(path) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read frps config");
            None
        }
    }
}

/// Replace the file at `path` with the rendered map. The new content is
/// written to a sibling temp file and then moved over the target.
///
/// A symlinked path updates the file it points at, and an existing file
/// keeps its permission bits. Ownership is not carried over.
pub fn write(path: &Path, map: &ConfigMap) -> Result<(), StoreError> {
    validate(map)?;

    let target = match std::fs::canonicalize(path) {
        Ok(real) => real,
        Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e.into()),
    };
    let permissions = match std::fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(render(map).as_bytes())?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;

    debug!(
        path = %path.display(),
        target = %target.display(),
        entries = map.len(),
        "Wrote frps config"
    );
    Ok(())
}

/// Entries that would not survive a read back are refused
fn validate(map: &ConfigMap) -> Result<(), StoreError> {
    for (key, value) in map {
        let reason = if key.trim().is_empty() {
            Some("key is empty")
        } else if key.contains('=') {
            Some("key contains '='")
        } else if key.trim_start().starts_with(COMMENT_MARKER) {
            Some("key starts with a comment marker")
        } else if key.contains(['\n', '\r']) {
            Some("key contains a line break")
        } else if value.contains(['\n', '\r']) {
            Some("value contains a line break")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(StoreError::InvalidEntry {
                key: key.clone(),
                reason,
            });
        }
    }
    Ok(())
}
