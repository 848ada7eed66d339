//! Error taxonomy for control operations

use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Broad class of a control failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Executable, config path or config file unavailable
    NotFound,
    /// Start while running, or stop while stopped
    AlreadyInState,
    /// Request payload unusable
    InvalidRequest,
    /// File or process operation failed
    IoFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyInState => "ALREADY_IN_STATE",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::IoFailure => "IO_FAILURE",
        }
    }
}

/// A control operation that did not happen. The display text is the
/// message returned to API clients.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("FRPS is already running")]
    AlreadyRunning,

    #[error("FRPS is not running")]
    NotRunning,

    #[error("FRPS executable or config not found")]
    NotConfigured,

    #[error("Config path not determined")]
    ConfigPathUnknown,

    #[error("Config file not found")]
    ConfigUnavailable,

    #[error("No config provided")]
    EmptyConfig,

    #[error("Failed to start FRPS: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to stop FRPS: {0}")]
    Terminate(String),

    #[error("Failed to update config: {0}")]
    ConfigWrite(#[from] StoreError),

    #[error("Task join error: {0}")]
    Task(String),
}

impl ControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::NotConfigured
            | ControlError::ConfigPathUnknown
            | ControlError::ConfigUnavailable => ErrorKind::NotFound,
            ControlError::AlreadyRunning | ControlError::NotRunning => ErrorKind::AlreadyInState,
            ControlError::EmptyConfig => ErrorKind::InvalidRequest,
            ControlError::Spawn(_)
            | ControlError::Terminate(_)
            | ControlError::ConfigWrite(_)
            | ControlError::Task(_) => ErrorKind::IoFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ControlError::AlreadyRunning.to_string(), "FRPS is already running");
        assert_eq!(ControlError::NotRunning.to_string(), "FRPS is not running");
        assert_eq!(
            ControlError::NotConfigured.to_string(),
            "FRPS executable or config not found"
        );
        assert_eq!(ControlError::ConfigPathUnknown.to_string(), "Config path not determined");
        assert_eq!(ControlError::ConfigUnavailable.to_string(), "Config file not found");
        assert_eq!(ControlError::EmptyConfig.to_string(), "No config provided");
    }

    #[test]
    fn test_messages_carry_detail() {
        let spawn = ControlError::Spawn(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "access denied",
        ));
        assert_eq!(spawn.to_string(), "Failed to start FRPS: access denied");

        let stop = ControlError::Terminate("no process could be terminated".to_string());
        assert_eq!(stop.to_string(), "Failed to stop FRPS: no process could be terminated");

        let write = ControlError::from(StoreError::NotFound("frps.ini".to_string()));
        assert_eq!(
            write.to_string(),
            "Failed to update config: config file not found: frps.ini"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ControlError::AlreadyRunning.kind(), ErrorKind::AlreadyInState);
        assert_eq!(ControlError::NotRunning.kind(), ErrorKind::AlreadyInState);
        assert_eq!(ControlError::NotConfigured.kind(), ErrorKind::NotFound);
        assert_eq!(ControlError::ConfigPathUnknown.kind(), ErrorKind::NotFound);
        assert_eq!(ControlError::EmptyConfig.kind(), ErrorKind::InvalidRequest);
        assert_eq!(
            ControlError::Terminate(String::new()).kind(),
            ErrorKind::IoFailure
        );
        assert_eq!(ControlError::Task(String::new()).kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_kind_serializes_like_header_value() {
        for kind in [
            ErrorKind::NotFound,
            ErrorKind::AlreadyInState,
            ErrorKind::InvalidRequest,
            ErrorKind::IoFailure,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
