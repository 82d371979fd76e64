//! Accent synchronization engine
//!
//! The engine owns the keyboard channel and the accent store. Every device
//! write goes through it, driven by [`EngineEvent`]s arriving on one channel:
//! store changes from the watcher thread, session transitions and stop
//! requests from the host.

mod latch;
mod state;
mod watcher;

use std::sync::Arc;

use steelsvc_transport::{locate, DeviceDiscovery, KeyboardChannel, Rgb};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::accent::{read_accent, AccentError, AccentStore, StoreResolver};
use crate::color;
use crate::error::EngineError;
use crate::session::{SessionAction, SessionEvent};

pub use latch::StopLatch;
pub use state::{EngineState, StopReason};

/// Color the keyboard shows when nothing is synchronized
pub const RESET_COLOR: Rgb = Rgb::RED;

/// Input to the engine loop
#[derive(Debug)]
pub enum EngineEvent {
    /// The accent store reported a change
    AccentChanged,
    /// A user session transition
    Session(SessionEvent),
    /// The change watch failed and will not fire again
    WatchFailed(AccentError),
    /// The host asked the engine to stop
    Stop,
}

pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Result of one synchronization cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The transformed color was sent to the keyboard
    Applied(Rgb),
    /// No accent was readable or the channel is closed
    Skipped,
}

pub struct SyncEngine {
    channel: KeyboardChannel,
    store: Arc<dyn AccentStore>,
    state: EngineState,
    stopped: StopLatch,
}

impl SyncEngine {
    /// Locate and open the keyboard, then resolve the accent store
    ///
    /// If the store cannot be resolved the already opened channel is reset
    /// and closed before the error is returned.
    pub fn initialize(
        discovery: &dyn DeviceDiscovery,
        resolver: &dyn StoreResolver,
    ) -> Result<Self, EngineError> {
        let mut state = EngineState::Uninitialized;
        transition(&mut state, EngineState::Locating);

        let path = locate(discovery).map_err(|e| {
            error!("No keyboard HID found: {}", e);
            EngineError::Locate(e)
        })?;
        let channel = KeyboardChannel::open(discovery, &path).map_err(|e| {
            error!("Failed to open keyboard channel: {}", e);
            EngineError::Open(e)
        })?;
        transition(&mut state, EngineState::ChannelOpen);

        let store = match resolver.resolve() {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to resolve accent color store: {}", e);
                release(&channel);
                return Err(EngineError::Store(e));
            }
        };
        info!("Reading accent color from {}", store.location());
        transition(&mut state, EngineState::StoreResolved);

        Ok(Self {
            channel,
            store,
            state,
            stopped: StopLatch::new(),
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn channel(&self) -> &KeyboardChannel {
        &self.channel
    }

    /// Latch signaled by [`shutdown`](Self::shutdown) once the keyboard is
    /// back to red and released
    pub fn stop_latch(&self) -> StopLatch {
        self.stopped.clone()
    }

    /// Read the accent, transform it and program all three regions
    pub fn synchronize(&mut self) -> SyncOutcome {
        let accent = match read_accent(&*self.store) {
            Ok(accent) => accent,
            Err(e) => {
                warn!("Skipping synchronization: {}", e);
                return SyncOutcome::Skipped;
            }
        };
        let backlight = color::transform(accent);
        info!("Syncing accent {} as backlight {}", accent, backlight);

        match self.channel.apply_color(backlight) {
            Ok(0) => {}
            Ok(failed) => warn!("{} of 4 reports failed during sync", failed),
            Err(e) => {
                warn!("Skipping synchronization: {}", e);
                return SyncOutcome::Skipped;
            }
        }
        self.enter(EngineState::Synced);
        SyncOutcome::Applied(backlight)
    }

    /// Return the keyboard to its power-on red
    pub fn reset(&self) {
        reset_backlight(&self.channel);
    }

    /// Process one event; returns why the loop must stop, if it must
    pub fn handle(&mut self, event: EngineEvent) -> Option<StopReason> {
        match event {
            EngineEvent::AccentChanged => {
                info!("Accent color changed");
                self.synchronize();
            }
            EngineEvent::Session(event) => {
                info!("Session {}", event);
                match event.action() {
                    SessionAction::Reset => self.reset(),
                    SessionAction::Resync => {
                        self.synchronize();
                    }
                }
            }
            EngineEvent::WatchFailed(e) => {
                error!("Accent watch failed: {}", e);
                return Some(StopReason::WatchFailed);
            }
            EngineEvent::Stop => {
                info!("Stop requested");
                return Some(StopReason::Requested);
            }
        }

        if !self.channel.is_open() {
            warn!("Keyboard channel is closed");
            return Some(StopReason::DeviceLost);
        }
        self.enter(EngineState::Watching);
        None
    }

    /// Arm the change watch, synchronize once, then process events until
    /// told to stop
    ///
    /// `events` is handed to the watcher thread. The loop also ends when
    /// every sender is gone. The engine is shut down on every path out.
    pub async fn run(
        mut self,
        events: EventSender,
        mut rx: EventReceiver,
    ) -> Result<StopReason, EngineError> {
        let watcher = match watcher::spawn(&*self.store, events) {
            Ok(handle) => handle,
            Err(e) => {
                error!("{}", e);
                self.shutdown();
                return Err(e);
            }
        };

        self.synchronize();
        self.enter(EngineState::Watching);
        info!("Watching for accent changes");

        let reason = loop {
            let Some(event) = rx.recv().await else {
                break StopReason::EventsClosed;
            };
            if let Some(reason) = self.handle(event) {
                break reason;
            }
        };

        info!("Leaving watch loop: {}", reason);
        self.shutdown();

        // Blocked in the OS wait; it exits on its next wakeup or with the process
        drop(watcher);
        Ok(reason)
    }

    /// Reset the backlight and release the device; later calls do nothing
    pub fn shutdown(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        release(&self.channel);
        self.enter(EngineState::Stopped);
        self.stopped.signal();
    }

    fn enter(&mut self, next: EngineState) {
        transition(&mut self.state, next);
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn transition(state: &mut EngineState, next: EngineState) {
    if *state == next {
        return;
    }
    debug_assert!(
        state.can_transition_to(next),
        "illegal engine transition {state} -> {next}"
    );
    debug!("Engine {} -> {}", state, next);
    *state = next;
}

/// Reset to red, then close
fn release(channel: &KeyboardChannel) {
    if !channel.is_open() {
        return;
    }
    reset_backlight(channel);
    channel.close();
}

fn reset_backlight(channel: &KeyboardChannel) {
    info!("Restoring default backlight");
    if let Err(e) = channel.apply_color(RESET_COLOR) {
        warn!("Backlight reset skipped: {}", e);
    }
}
