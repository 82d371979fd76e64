//! hidapi-backed feature report device

use hidapi::HidDevice;
use tracing::debug;

use crate::error::TransportError;
use crate::types::DevicePath;
use crate::FeatureDevice;

/// Open HID interface used only for feature reports
///
/// hidapi opens the path with shared read/write access and falls back to a
/// zero-access handle when the OS owns the keyboard, which still permits
/// `HidD_SetFeature`.
pub struct HidFeatureDevice {
    device: HidDevice,
    path: DevicePath,
}

impl HidFeatureDevice {
    pub fn new(device: HidDevice, path: DevicePath) -> Self {
        Self { device, path }
    }
}

impl FeatureDevice for HidFeatureDevice {
    fn send_feature_report(&self, report: &[u8]) -> Result<(), TransportError> {
        self.device.send_feature_report(report)?;
        Ok(())
    }
}

impl Drop for HidFeatureDevice {
    fn drop(&mut self) {
        // HidDevice closes its handle on drop
        debug!("Releasing HID handle for {}", self.path);
    }
}
