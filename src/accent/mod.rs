//! Desktop accent color source
//!
//! The accent lives in the per-user DWM theme store as a packed `0xAARRGGBB`
//! value. Two value names are consulted: a keyboard-specific override first,
//! then the general desktop accent.
//!
//! The store is reached through [`AccentStore`] so the engine can run against
//! the Windows registry or an in-memory store in tests.

#[cfg(windows)]
mod registry;

use std::sync::Arc;

use steelsvc_transport::Rgb;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(windows)]
pub use registry::{RegistryStore, SessionStoreResolver};

/// Keyboard-specific accent override, checked first
pub const KEYBOARD_ACCENT_VALUE: &str = "KeyboardColorizationColor";

/// General desktop accent, checked when the override is absent
pub const DESKTOP_ACCENT_VALUE: &str = "ColorizationColor";

/// Value names in lookup order
pub const ACCENT_VALUE_NAMES: [&str; 2] = [KEYBOARD_ACCENT_VALUE, DESKTOP_ACCENT_VALUE];

/// Errors from the accent store
#[derive(Error, Debug)]
pub enum AccentError {
    #[error("Value {name} not readable (os error {code:#010x})")]
    ValueMissing { name: String, code: u32 },

    #[error("No accent color value is readable")]
    Unavailable,

    #[error("No interactive session is attached to the console")]
    NoActiveSession,

    #[error("{op} failed (os error {code:#010x})")]
    Os { op: &'static str, code: u32 },

    #[error("Change notification failed: {0}")]
    Watch(String),

    #[error("Accent color store not supported on this platform")]
    Unsupported,
}

impl AccentError {
    pub fn os_code(&self) -> Option<u32> {
        match self {
            Self::ValueMissing { code, .. } | Self::Os { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Per-user theme store holding the accent color
pub trait AccentStore: Send + Sync {
    /// Human-readable location of the store, for logs
    fn location(&self) -> &str;

    /// Read a 32-bit value by name
    fn read_value(&self, name: &str) -> Result<u32, AccentError>;

    /// Create a change watch on this store
    fn watch(&self) -> Result<Box<dyn ChangeWatch>, AccentError>;
}

/// One-shot change notification on an [`AccentStore`]
///
/// `arm` registers interest in the next change; `wait` blocks until that
/// change happens. Each `arm` reports at most one change, so callers re-arm
/// before acting on a wakeup.
pub trait ChangeWatch: Send {
    fn arm(&mut self) -> Result<(), AccentError>;

    fn wait(&mut self) -> Result<(), AccentError>;
}

/// Locates the accent store of the interactive user
pub trait StoreResolver {
    fn resolve(&self) -> Result<Arc<dyn AccentStore>, AccentError>;
}

/// Extract the RGB channels of a packed accent value (alpha ignored)
pub fn unpack_accent(value: u32) -> Rgb {
    Rgb {
        r: (value >> 16 & 0xFF) as u8,
        g: (value >> 8 & 0xFF) as u8,
        b: (value & 0xFF) as u8,
    }
}

/// Pack RGB channels the way the theme store does (alpha zero)
pub fn pack_accent(color: Rgb) -> u32 {
    (color.r as u32) << 16 | (color.g as u32) << 8 | color.b as u32
}

/// Read the current accent color, preferring the keyboard override
pub fn read_accent(store: &dyn AccentStore) -> Result<Rgb, AccentError> {
    for name in ACCENT_VALUE_NAMES {
        match store.read_value(name) {
            Ok(value) => {
                debug!("Accent {} = {:#010x}", name, value);
                return Ok(unpack_accent(value));
            }
            Err(e) => debug!("Accent {} not used: {}", name, e),
        }
    }

    warn!("No accent color readable under {}", store.location());
    Err(AccentError::Unavailable)
}

/// Use the `primary` store, or the `fallback` store when it cannot be opened
///
/// The fallback error is returned when both fail.
pub fn resolve_with_fallback<P, F>(
    primary: P,
    fallback: F,
) -> Result<Arc<dyn AccentStore>, AccentError>
where
    P: FnOnce() -> Result<Arc<dyn AccentStore>, AccentError>,
    F: FnOnce() -> Result<Arc<dyn AccentStore>, AccentError>,
{
    match primary() {
        Ok(store) => Ok(store),
        Err(e) => {
            warn!("Active session store unavailable ({}), falling back", e);
            fallback()
        }
    }
}

/// Resolver for the current platform
pub fn default_resolver() -> Box<dyn StoreResolver> {
    #[cfg(windows)]
    {
        Box::new(SessionStoreResolver)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnsupportedResolver)
    }
}

/// Resolver used where no theme store exists
#[cfg(not(windows))]
struct UnsupportedResolver;

#[cfg(not(windows))]
impl StoreResolver for UnsupportedResolver {
    fn resolve(&self) -> Result<Arc<dyn AccentStore>, AccentError> {
        Err(AccentError::Unsupported)
    }
}
