//! Hosting glue shared by the console and service entry points

use steelsvc_transport::DeviceDiscovery;
use tracing::info;

use crate::accent::StoreResolver;
use crate::engine::{EventReceiver, EventSender, StopReason, SyncEngine};
use crate::error::EngineError;

/// Initialize the engine and drive it on a current-thread runtime until it
/// stops
///
/// `on_running` is called with the initialized engine once the keyboard is
/// open and the accent store is resolved, right before the watch loop starts.
pub fn run_blocking(
    discovery: &dyn DeviceDiscovery,
    resolver: &dyn StoreResolver,
    events: EventSender,
    rx: EventReceiver,
    on_running: impl FnOnce(&SyncEngine),
) -> Result<StopReason, EngineError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(EngineError::Runtime)?;

    let engine = SyncEngine::initialize(discovery, resolver)?;
    on_running(&engine);

    let reason = runtime.block_on(engine.run(events, rx))?;
    info!("Engine stopped: {}", reason);
    Ok(reason)
}
