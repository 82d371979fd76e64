//! Transport layer for MSI SteelSeries keyboard backlights
//!
//! This crate covers everything between the host and the backlight
//! controller:
//!
//! - Device signature and HID enumeration (`device_registry`, `discovery`)
//! - The 8-byte feature report protocol (`protocol`)
//! - The exclusive control channel that programs the three regions (`channel`)

pub mod channel;
pub mod device_registry;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod types;

mod hid_feature;

pub use channel::KeyboardChannel;
pub use device_registry::{matches_signature, PATH_SIGNATURE, PRODUCT_ID, VENDOR_ID};
pub use discovery::{locate, DeviceDiscovery, HidDiscovery};
pub use error::TransportError;
pub use hid_feature::HidFeatureDevice;
pub use types::{Candidate, DevicePath, Region, Rgb};

/// A device that accepts HID feature reports
///
/// Sends are synchronous and fire-and-forget: the controller returns no
/// acknowledgement, so `Ok` only means the OS accepted the transfer.
pub trait FeatureDevice: Send {
    /// Send one feature report; the first byte is the report id
    fn send_feature_report(&self, report: &[u8]) -> Result<(), TransportError>;
}
