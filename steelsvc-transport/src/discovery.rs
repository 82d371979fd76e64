//! Device discovery for the SteelSeries backlight controller

use std::ffi::CString;

use hidapi::HidApi;
use tracing::{debug, info, warn};

use crate::device_registry;
use crate::error::TransportError;
use crate::hid_feature::HidFeatureDevice;
use crate::types::{Candidate, DevicePath};
use crate::FeatureDevice;

/// Device discovery abstraction
pub trait DeviceDiscovery: Send + Sync {
    /// Enumerate every HID interface the OS currently exposes
    fn enumerate(&self) -> Result<Vec<Candidate>, TransportError>;

    /// Open a device path for sending feature reports
    fn open_path(&self, path: &DevicePath) -> Result<Box<dyn FeatureDevice>, TransportError>;
}

/// Find the first enumerated interface carrying the keyboard signature
///
/// Unreadable candidates are skipped; the scan stops at the first match.
pub fn locate(discovery: &dyn DeviceDiscovery) -> Result<DevicePath, TransportError> {
    let candidates = discovery.enumerate()?;
    debug!("Scanning {} HID interfaces", candidates.len());

    for candidate in candidates {
        match candidate {
            Candidate::Path(path) => {
                if device_registry::matches_signature(path.as_str()) {
                    info!("Found keyboard HID on {}", path);
                    return Ok(path);
                }
            }
            Candidate::Unreadable { index, reason } => {
                warn!("Could not obtain details for HID interface {}: {}", index, reason);
            }
        }
    }

    Err(TransportError::DeviceNotFound(format!(
        "no HID interface matching {}",
        device_registry::PATH_SIGNATURE
    )))
}

/// HID discovery backed by hidapi
#[derive(Debug, Default, Clone, Copy)]
pub struct HidDiscovery;

impl HidDiscovery {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceDiscovery for HidDiscovery {
    fn enumerate(&self) -> Result<Vec<Candidate>, TransportError> {
        let api = HidApi::new()?;

        let candidates = api
            .device_list()
            .enumerate()
            .map(|(index, info)| match info.path().to_str() {
                Ok(path) => Candidate::Path(DevicePath::new(path)),
                Err(e) => Candidate::Unreadable {
                    index,
                    reason: e.to_string(),
                },
            })
            .collect();

        Ok(candidates)
    }

    fn open_path(&self, path: &DevicePath) -> Result<Box<dyn FeatureDevice>, TransportError> {
        let api = HidApi::new()?;
        let c_path = CString::new(path.as_str())
            .map_err(|_| TransportError::InvalidPath(path.to_string()))?;

        match api.open_path(&c_path) {
            Ok(device) => Ok(Box::new(HidFeatureDevice::new(device, path.clone()))),
            Err(e) => {
                let code = last_open_error();
                warn!("Could not open {}: {} (os error {:?})", path, e, code);
                Err(TransportError::Open {
                    path: path.to_string(),
                    reason: e.to_string(),
                    code,
                })
            }
        }
    }
}

/// Thread error code left by the failed `CreateFileW`, best-effort: hidapi
/// formats its message in between
#[cfg(windows)]
fn last_open_error() -> Option<u32> {
    os_code(std::io::Error::last_os_error().raw_os_error())
}

/// errno is not meaningful after a failed hidapi open on other platforms
#[cfg(not(windows))]
fn last_open_error() -> Option<u32> {
    None
}

/// A zero (or absent) code means no error was recorded
#[cfg_attr(not(windows), allow(dead_code))]
fn os_code(raw: Option<i32>) -> Option<u32> {
    raw.map(|code| code as u32).filter(|&code| code != 0)
}
