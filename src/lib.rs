// SteelSeriesSvc - accent color sync for MSI SteelSeries keyboards
// Accent source, color transform, sync engine and service host

pub mod accent;
pub mod color;
pub mod console;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod logging;
pub mod service;
pub mod session;

#[cfg(windows)]
mod winutil;

pub use accent::{read_accent, AccentError, AccentStore, ChangeWatch, StoreResolver};
pub use engine::{
    event_channel, EngineEvent, EngineState, EventReceiver, EventSender, StopLatch, StopReason,
    SyncEngine, SyncOutcome,
};
pub use error::EngineError;
pub use session::{SessionAction, SessionEvent};
