//! Session transitions reaching the engine
//!
//! Lock and logoff put the keyboard back to red; unlock and logon re-read the
//! accent, which may have changed while the session was away.

mod common;

use common::{apply_sequence, wait_until, Bus, FixedResolver, MockDiscovery, MockStore};
use steelsvc::accent::DESKTOP_ACCENT_VALUE;
use steelsvc::engine::{event_channel, EngineEvent, EngineState, StopReason, SyncEngine};
use steelsvc::session::SessionEvent;
use steelsvc_transport::protocol::Report;
use steelsvc_transport::{Region, Rgb};

fn engine(bus: &std::sync::Arc<Bus>, accent: u32) -> (SyncEngine, std::sync::Arc<MockStore>) {
    let (store, _trigger) = MockStore::new(&[(DESKTOP_ACCENT_VALUE, accent)]);
    let engine = SyncEngine::initialize(
        &MockDiscovery::with_keyboard(bus),
        &FixedResolver(Some(store.clone())),
    )
    .unwrap();
    (engine, store)
}

#[test]
fn lock_sends_red_to_each_region_in_order() {
    let bus = Bus::new();
    let (mut engine, _store) = engine(&bus, 0xFF0078D7);
    engine.synchronize();
    bus.clear();

    assert_eq!(engine.handle(EngineEvent::Session(SessionEvent::Lock)), None);

    let colors: Vec<Report> = bus
        .reports()
        .into_iter()
        .filter(|report| matches!(report, Report::SetColor(..)))
        .collect();
    assert_eq!(
        colors,
        [
            Report::SetColor(Region::Left, Rgb::RED),
            Report::SetColor(Region::Middle, Rgb::RED),
            Report::SetColor(Region::Right, Rgb::RED),
        ]
    );
    assert_eq!(engine.state(), EngineState::Watching);
    assert!(engine.channel().is_open());
}

#[test]
fn logoff_resets() {
    let bus = Bus::new();
    let (mut engine, _store) = engine(&bus, 0xFF0078D7);

    engine.handle(EngineEvent::Session(SessionEvent::Logoff));
    assert_eq!(bus.reports(), apply_sequence(Rgb::RED));
}

#[test]
fn unlock_resyncs_with_current_accent() {
    let bus = Bus::new();
    let (mut engine, store) = engine(&bus, 0xFF0078D7);
    engine.handle(EngineEvent::Session(SessionEvent::Lock));
    bus.clear();

    // Accent changed while locked
    store.set(DESKTOP_ACCENT_VALUE, 0xFF808080);
    engine.handle(EngineEvent::Session(SessionEvent::Unlock));

    assert_eq!(bus.reports(), apply_sequence(Rgb::new(128, 128, 128)));
}

#[test]
fn logon_resyncs() {
    let bus = Bus::new();
    let (mut engine, _store) = engine(&bus, 0x00FFFFFF);

    engine.handle(EngineEvent::Session(SessionEvent::Logon));
    assert_eq!(bus.reports(), apply_sequence(Rgb::WHITE));
}

#[test]
fn session_events_do_not_stop_engine() {
    let bus = Bus::new();
    let (mut engine, _store) = engine(&bus, 0xFF0078D7);

    for event in [
        SessionEvent::Lock,
        SessionEvent::Unlock,
        SessionEvent::Logoff,
        SessionEvent::Logon,
    ] {
        assert_eq!(engine.handle(EngineEvent::Session(event)), None);
    }
    assert_eq!(bus.closed(), 0);
}

#[tokio::test]
async fn lock_and_unlock_through_running_loop() {
    let bus = Bus::new();
    let (store, _trigger) = MockStore::new(&[(DESKTOP_ACCENT_VALUE, 0xFF0078D7)]);
    let engine = SyncEngine::initialize(
        &MockDiscovery::with_keyboard(&bus),
        &FixedResolver(Some(store.clone())),
    )
    .unwrap();

    let (events, rx) = event_channel();
    let host = events.clone();
    let task = tokio::spawn(engine.run(events, rx));
    wait_until("initial sync", || bus.report_count() == 4).await;

    host.send(EngineEvent::Session(SessionEvent::Lock)).unwrap();
    store.set(DESKTOP_ACCENT_VALUE, 0x00FFFFFF);
    host.send(EngineEvent::Session(SessionEvent::Unlock)).unwrap();
    host.send(EngineEvent::Stop).unwrap();

    assert_eq!(task.await.unwrap().unwrap(), StopReason::Requested);

    let reports = bus.reports();
    assert_eq!(reports.len(), 16);
    assert_eq!(reports[4..8], apply_sequence(Rgb::RED)[..]);
    assert_eq!(reports[8..12], apply_sequence(Rgb::WHITE)[..]);
    assert_eq!(reports[12..], apply_sequence(Rgb::RED)[..]);
}
