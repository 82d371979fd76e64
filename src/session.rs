//! User session transitions reported by the service manager

use std::fmt;

/// `WTS_SESSION_LOGON`
pub const WTS_SESSION_LOGON: u32 = 0x5;
/// `WTS_SESSION_LOGOFF`
pub const WTS_SESSION_LOGOFF: u32 = 0x6;
/// `WTS_SESSION_LOCK`
pub const WTS_SESSION_LOCK: u32 = 0x7;
/// `WTS_SESSION_UNLOCK`
pub const WTS_SESSION_UNLOCK: u32 = 0x8;

/// Session transition relevant to the backlight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Logon,
    Logoff,
    Lock,
    Unlock,
}

/// What the engine does in response to a session transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Return the keyboard to bright red
    Reset,
    /// Re-read the accent and apply it
    Resync,
}

impl SessionEvent {
    /// Map a `SERVICE_CONTROL_SESSIONCHANGE` event type
    ///
    /// Console/remote connect and disconnect notifications return `None`.
    pub fn from_wts_code(code: u32) -> Option<Self> {
        match code {
            WTS_SESSION_LOGON => Some(Self::Logon),
            WTS_SESSION_LOGOFF => Some(Self::Logoff),
            WTS_SESSION_LOCK => Some(Self::Lock),
            WTS_SESSION_UNLOCK => Some(Self::Unlock),
            _ => None,
        }
    }

    pub fn action(self) -> SessionAction {
        match self {
            Self::Lock | Self::Logoff => SessionAction::Reset,
            Self::Unlock | Self::Logon => SessionAction::Resync,
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Logon => "logon",
            Self::Logoff => "logoff",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        };
        f.write_str(name)
    }
}
