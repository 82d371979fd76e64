//! Wire protocol for the SteelSeries backlight controller
//!
//! Every command is a single 8-byte feature report:
//!
//! ```text
//! [0]  report id / protocol version (0x01)
//! [1]  command class (0x02)
//! [2]  command
//! [3]  argument (mode or region id)
//! [4..7] R, G, B (set-color only)
//! [7]  padding
//! ```
//!
//! The controller sends no acknowledgement.

use std::fmt;

use crate::types::{Region, Rgb};

/// Size of every feature report, report id included
pub const REPORT_SIZE: usize = 8;

/// Report id, doubling as protocol version
pub const REPORT_ID: u8 = 0x01;

/// Command class for backlight commands
pub const CLASS_BACKLIGHT: u8 = 0x02;

/// Backlight commands
pub mod cmd {
    /// Program the color of one region
    pub const SET_COLOR: u8 = 0x40;
    /// Select the lighting mode
    pub const SET_MODE: u8 = 0x41;

    pub fn name(cmd: u8) -> &'static str {
        match cmd {
            SET_COLOR => "SET_COLOR",
            SET_MODE => "SET_MODE",
            _ => "UNKNOWN",
        }
    }
}

/// Lighting modes accepted by `SET_MODE`
pub mod mode {
    /// Static per-region colors ("normal colorization")
    pub const NORMAL: u8 = 0x01;
}

/// Build the report that switches the controller into normal colorization
///
/// Region colors are only honored while this mode is active.
pub fn colorization_mode_report() -> [u8; REPORT_SIZE] {
    [
        REPORT_ID,
        CLASS_BACKLIGHT,
        cmd::SET_MODE,
        mode::NORMAL,
        0x00,
        0x00,
        0x00,
        0x00,
    ]
}

/// Build the report that sets one region to `color`
pub fn set_color_report(region: Region, color: Rgb) -> [u8; REPORT_SIZE] {
    [
        REPORT_ID,
        CLASS_BACKLIGHT,
        cmd::SET_COLOR,
        region.id(),
        color.r,
        color.g,
        color.b,
        0x00,
    ]
}

/// Decoded form of a backlight report, used for transfer logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    SetMode(u8),
    SetColor(Region, Rgb),
}

/// Parse a report produced by this module
pub fn parse_report(buf: &[u8]) -> Option<Report> {
    if buf.len() != REPORT_SIZE || buf[0] != REPORT_ID || buf[1] != CLASS_BACKLIGHT {
        return None;
    }
    match buf[2] {
        cmd::SET_MODE => Some(Report::SetMode(buf[3])),
        cmd::SET_COLOR => Region::from_id(buf[3])
            .map(|region| Report::SetColor(region, Rgb::new(buf[4], buf[5], buf[6]))),
        _ => None,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetMode(mode::NORMAL) => {
                write!(f, "{} normal colorization", cmd::name(cmd::SET_MODE))
            }
            Self::SetMode(other) => write!(f, "{} {:#04x}", cmd::name(cmd::SET_MODE), other),
            Self::SetColor(region, color) => {
                write!(f, "{} {} {}", cmd::name(cmd::SET_COLOR), region, color)
            }
        }
    }
}

/// One-line description of a raw report for logs
pub fn describe(buf: &[u8]) -> String {
    match parse_report(buf) {
        Some(report) => report.to_string(),
        None => format!("unrecognized report {:02X?}", buf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorization_mode_bytes() {
        assert_eq!(
            colorization_mode_report(),
            [0x01, 0x02, 0x41, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_set_color_bytes_per_region() {
        let color = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(
            set_color_report(Region::Left, color),
            [0x01, 0x02, 0x40, 0x01, 0x12, 0x34, 0x56, 0x00]
        );
        assert_eq!(
            set_color_report(Region::Middle, color),
            [0x01, 0x02, 0x40, 0x02, 0x12, 0x34, 0x56, 0x00]
        );
        assert_eq!(
            set_color_report(Region::Right, Rgb::RED),
            [0x01, 0x02, 0x40, 0x03, 0xFF, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_parse_report() {
        assert_eq!(
            parse_report(&colorization_mode_report()),
            Some(Report::SetMode(mode::NORMAL))
        );
        assert_eq!(
            parse_report(&set_color_report(Region::Middle, Rgb::new(1, 2, 3))),
            Some(Report::SetColor(Region::Middle, Rgb::new(1, 2, 3)))
        );
        // Unknown region
        assert_eq!(
            parse_report(&[0x01, 0x02, 0x40, 0x04, 0, 0, 0, 0]),
            None
        );
        // Wrong length
        assert_eq!(parse_report(&[0x01, 0x02, 0x41]), None);
    }

    #[test]
    fn test_cmd_names() {
        assert_eq!(cmd::name(cmd::SET_COLOR), "SET_COLOR");
        assert_eq!(cmd::name(cmd::SET_MODE), "SET_MODE");
        assert_eq!(cmd::name(0x99), "UNKNOWN");
    }

    #[test]
    fn test_describe_reports() {
        assert_eq!(
            describe(&colorization_mode_report()),
            "SET_MODE normal colorization"
        );
        assert_eq!(
            describe(&set_color_report(Region::Right, Rgb::new(0, 0x9C, 0xFF))),
            "SET_COLOR right #009CFF"
        );
        assert!(describe(&[0x02, 0x02, 0x40]).starts_with("unrecognized report"));
    }
}
