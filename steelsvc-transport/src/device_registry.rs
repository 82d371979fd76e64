//! Device registry - hardware signature of the supported keyboard
//!
//! MSI laptops ship a SteelSeries-branded keyboard whose backlight controller
//! enumerates as a HID device with a fixed VID/PID pair. The pair is matched
//! against the interface path the OS reports, not against descriptor fields.

/// SteelSeries backlight controller vendor ID
pub const VENDOR_ID: u16 = 0x1770;

/// SteelSeries backlight controller product ID
pub const PRODUCT_ID: u16 = 0xFF00;

/// VID/PID sequence as it appears inside a device interface path
pub const PATH_SIGNATURE: &str = "vid_1770&pid_ff00";

/// Check whether an OS device path belongs to the supported keyboard
///
/// Case-insensitive: SetupAPI reports lower-case paths while hidapi reports
/// `VID_1770&PID_FF00`.
pub fn matches_signature(path: &str) -> bool {
    let signature = PATH_SIGNATURE.as_bytes();
    path.as_bytes()
        .windows(signature.len())
        .any(|window| window.eq_ignore_ascii_case(signature))
}
