//! Control channel to the keyboard backlight
//!
//! The channel owns the only device handle of the process. The handle and its
//! "still open" state share one lock so a write can never race the close.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::discovery::DeviceDiscovery;
use crate::error::TransportError;
use crate::protocol;
use crate::types::{DevicePath, Region, Rgb};
use crate::FeatureDevice;

pub struct KeyboardChannel {
    path: DevicePath,
    device: Mutex<Option<Box<dyn FeatureDevice>>>,
}

impl KeyboardChannel {
    /// Open the keyboard at `path`
    pub fn open(discovery: &dyn DeviceDiscovery, path: &DevicePath) -> Result<Self, TransportError> {
        let device = discovery.open_path(path)?;
        info!("Opened keyboard channel on {}", path);
        Ok(Self::from_device(path.clone(), device))
    }

    /// Wrap an already opened device
    pub fn from_device(path: DevicePath, device: Box<dyn FeatureDevice>) -> Self {
        Self {
            path,
            device: Mutex::new(Some(device)),
        }
    }

    pub fn path(&self) -> &DevicePath {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.device.lock().is_some()
    }

    /// Switch the controller into normal colorization mode
    pub fn enter_colorization_mode(&self) -> Result<(), TransportError> {
        let guard = self.device.lock();
        let device = guard.as_deref().ok_or(TransportError::Closed)?;
        send_mode(device)
    }

    /// Program a single region
    pub fn set_region_color(&self, region: Region, color: Rgb) -> Result<(), TransportError> {
        let guard = self.device.lock();
        let device = guard.as_deref().ok_or(TransportError::Closed)?;
        send_color(device, region, color)
    }

    /// Enter colorization mode and set every region to `color`
    ///
    /// The whole sequence runs under one lock acquisition. Transfer failures
    /// are logged and skipped; the number of failed transfers is returned.
    pub fn apply_color(&self, color: Rgb) -> Result<usize, TransportError> {
        let guard = self.device.lock();
        let device = guard.as_deref().ok_or(TransportError::Closed)?;

        let mut failed = 0;
        if let Err(e) = send_mode(device) {
            warn!("Colorization mode report failed: {}", e);
            failed += 1;
        }
        for region in Region::ALL {
            if let Err(e) = send_color(device, region, color) {
                warn!("Set color report for {} region failed: {}", region, e);
                failed += 1;
            }
        }
        Ok(failed)
    }

    /// Release the device handle
    ///
    /// Returns `true` if this call closed the handle, `false` if it was
    /// already closed.
    pub fn close(&self) -> bool {
        let device = self.device.lock().take();
        match device {
            Some(device) => {
                drop(device);
                info!("Closed keyboard channel on {}", self.path);
                true
            }
            None => false,
        }
    }
}

fn send_mode(device: &dyn FeatureDevice) -> Result<(), TransportError> {
    send(device, &protocol::colorization_mode_report())
}

fn send_color(device: &dyn FeatureDevice, region: Region, color: Rgb) -> Result<(), TransportError> {
    send(device, &protocol::set_color_report(region, color))
}

fn send(device: &dyn FeatureDevice, report: &[u8]) -> Result<(), TransportError> {
    debug!("Sending {}: {:02X?}", protocol::describe(report), report);
    device.send_feature_report(report)
}
