//! Engine error types

use steelsvc_transport::TransportError;
use thiserror::Error;

use crate::accent::AccentError;

/// `ERROR_NO_SUCH_DEVICE_INTERFACE` from SetupAPI
pub const ERROR_NO_SUCH_DEVICE_INTERFACE: u32 = 0xE000_0225;

/// Fatal engine errors; each one ends the process before or instead of the
/// watch loop
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Keyboard discovery failed: {0}")]
    Locate(TransportError),

    #[error("Could not open keyboard channel: {0}")]
    Open(TransportError),

    #[error("Could not resolve accent color store: {0}")]
    Store(AccentError),

    #[error("Could not watch accent color store: {0}")]
    Watch(AccentError),

    #[error("Could not spawn accent watcher thread: {0}")]
    Spawn(std::io::Error),

    #[error("Could not build runtime: {0}")]
    Runtime(std::io::Error),
}

impl EngineError {
    /// Win32-style exit code reported to the service manager
    pub fn exit_code(&self) -> u32 {
        let code = match self {
            Self::Locate(TransportError::DeviceNotFound(_)) => {
                Some(ERROR_NO_SUCH_DEVICE_INTERFACE)
            }
            Self::Locate(e) | Self::Open(e) => e.os_code(),
            Self::Store(e) | Self::Watch(e) => e.os_code(),
            Self::Spawn(e) | Self::Runtime(e) => e.raw_os_error().map(|c| c as u32),
        };
        match code {
            Some(0) | None => 1,
            Some(code) => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let not_found = EngineError::Locate(TransportError::DeviceNotFound("none".into()));
        assert_eq!(not_found.exit_code(), ERROR_NO_SUCH_DEVICE_INTERFACE);

        let denied = EngineError::Open(TransportError::Open {
            path: "kbd".into(),
            reason: "Access is denied.".into(),
            code: Some(5),
        });
        assert_eq!(denied.exit_code(), 5);

        let store = EngineError::Store(AccentError::Os {
            op: "RegOpenKeyExW",
            code: 2,
        });
        assert_eq!(store.exit_code(), 2);

        assert_eq!(EngineError::Store(AccentError::Unsupported).exit_code(), 1);
        assert_eq!(
            EngineError::Open(TransportError::Open {
                path: "kbd".into(),
                reason: "hid_open_path failed".into(),
                code: None,
            })
            .exit_code(),
            1
        );
    }
}
