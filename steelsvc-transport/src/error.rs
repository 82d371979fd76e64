//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// `code` is the OS error observed after the failed open, when one was
    /// recorded; hidapi's message is the primary diagnostic
    #[error("Could not open {path}: {reason}")]
    Open {
        path: String,
        reason: String,
        code: Option<u32>,
    },

    #[error("Device channel is closed")]
    Closed,

    #[error("HID error: {0}")]
    HidError(String),

    #[error("HID permission denied: {0}")]
    HidPermissionDenied(String),

    #[error("Unreadable device path: {0}")]
    InvalidPath(String),
}

impl TransportError {
    /// OS error code to report when this error terminates the process
    pub fn os_code(&self) -> Option<u32> {
        match self {
            Self::Open { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") {
            TransportError::HidPermissionDenied(msg)
        } else {
            TransportError::HidError(msg)
        }
    }
}
