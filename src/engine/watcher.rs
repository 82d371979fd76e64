//! Dedicated thread blocking on accent store change notifications

use std::thread::JoinHandle;

use tracing::debug;

use super::{EngineEvent, EventSender};
use crate::accent::{AccentStore, ChangeWatch};
use crate::error::EngineError;

/// Arm a change watch on `store` and hand it to a watcher thread
///
/// The watch is armed before this returns, so any change made after the call
/// produces an `AccentChanged` event.
pub(crate) fn spawn(
    store: &dyn AccentStore,
    events: EventSender,
) -> Result<JoinHandle<()>, EngineError> {
    let mut watch = store.watch().map_err(EngineError::Watch)?;
    watch.arm().map_err(EngineError::Watch)?;

    let location = store.location().to_string();
    std::thread::Builder::new()
        .name("accent-watch".into())
        .spawn(move || watch_loop(watch, events, location))
        .map_err(EngineError::Spawn)
}

fn watch_loop(mut watch: Box<dyn ChangeWatch>, events: EventSender, location: String) {
    debug!("Watching {} for accent changes", location);

    loop {
        // Re-arm before reporting so the resync cannot miss a later change
        let event = match watch.wait().and_then(|()| watch.arm()) {
            Ok(()) => EngineEvent::AccentChanged,
            Err(e) => EngineEvent::WatchFailed(e),
        };
        let fatal = matches!(event, EngineEvent::WatchFailed(_));

        if events.send(event).is_err() {
            debug!("Engine gone, accent watcher exiting");
            return;
        }
        if fatal {
            return;
        }
    }
}
