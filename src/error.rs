use thiserror::Error;

use crate::permissions::PermissionKind;

/// Failures a call can run into. Only `Config` is allowed to stop anything, and it can
/// only surface before a call starts; the rest are logged and swallowed by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("{0} permission unavailable")]
    PermissionUnavailable(PermissionKind),

    #[error("recording failed: {0}")]
    Recording(String),

    #[error("speech synthesis failed: {0}")]
    Speech(String),

    #[error("display update failed: {0}")]
    Display(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CallError {
    pub fn config(message: impl Into<String>) -> Self {
        CallError::Config(message.into())
    }
}
