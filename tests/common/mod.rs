//! In-memory keyboard and accent store shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;
use steelsvc::accent::{AccentError, AccentStore, ChangeWatch, StoreResolver};
use steelsvc_transport::protocol::{cmd, parse_report, Report};
use steelsvc_transport::{Candidate, DeviceDiscovery, DevicePath, FeatureDevice, Rgb, TransportError};

pub const KEYBOARD_PATH: &str =
    r"\\?\HID#VID_1770&PID_FF00&Col01#7&2b8f4e0&0&0000#{4d1e55b2-f16f-11cf-88cb-111111000030}";
pub const MOUSE_PATH: &str =
    r"\\?\HID#VID_046D&PID_C52B&MI_00#8&1a2b3c4d&0&0000#{4d1e55b2-f16f-11cf-88cb-111111000030}";

/// Everything sent to, opened on and closed on the mock keyboard
#[derive(Default)]
pub struct Bus {
    reports: Mutex<Vec<Vec<u8>>>,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    fail_region: Mutex<Option<u8>>,
}

impl Bus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .iter()
            .map(|raw| parse_report(raw).expect("malformed report"))
            .collect()
    }

    pub fn raw_reports(&self) -> Vec<Vec<u8>> {
        self.reports.lock().clone()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn clear(&self) {
        self.reports.lock().clear();
    }

    pub fn fail_region(&self, region: Option<u8>) {
        *self.fail_region.lock() = region;
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// The four reports of one full apply
pub fn apply_sequence(color: Rgb) -> Vec<Report> {
    use steelsvc_transport::Region;
    let mut reports = vec![Report::SetMode(0x01)];
    reports.extend(Region::ALL.map(|region| Report::SetColor(region, color)));
    reports
}

struct MockDevice {
    bus: Arc<Bus>,
}

impl FeatureDevice for MockDevice {
    fn send_feature_report(&self, report: &[u8]) -> Result<(), TransportError> {
        self.bus.reports.lock().push(report.to_vec());
        if report[2] == cmd::SET_COLOR && *self.bus.fail_region.lock() == Some(report[3]) {
            return Err(TransportError::HidError("pipe stalled".into()));
        }
        Ok(())
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.bus.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockDiscovery {
    candidates: Vec<Candidate>,
    open_error: Option<u32>,
    bus: Arc<Bus>,
}

impl MockDiscovery {
    /// A mouse and the keyboard
    pub fn with_keyboard(bus: &Arc<Bus>) -> Self {
        Self {
            candidates: vec![
                Candidate::Path(DevicePath::new(MOUSE_PATH)),
                Candidate::Path(DevicePath::new(KEYBOARD_PATH)),
            ],
            open_error: None,
            bus: bus.clone(),
        }
    }

    /// Only a mouse
    pub fn without_keyboard(bus: &Arc<Bus>) -> Self {
        Self {
            candidates: vec![Candidate::Path(DevicePath::new(MOUSE_PATH))],
            open_error: None,
            bus: bus.clone(),
        }
    }

    /// The keyboard is present but opening it fails with `code`
    pub fn refusing_open(bus: &Arc<Bus>, code: u32) -> Self {
        Self {
            open_error: Some(code),
            ..Self::with_keyboard(bus)
        }
    }
}

impl DeviceDiscovery for MockDiscovery {
    fn enumerate(&self) -> Result<Vec<Candidate>, TransportError> {
        Ok(self.candidates.clone())
    }

    fn open_path(&self, path: &DevicePath) -> Result<Box<dyn FeatureDevice>, TransportError> {
        if let Some(code) = self.open_error {
            return Err(TransportError::Open {
                path: path.to_string(),
                reason: "mock open refused".into(),
                code: Some(code),
            });
        }
        self.bus.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDevice {
            bus: self.bus.clone(),
        }))
    }
}

/// Accent store backed by a map, with a change watch driven by [`WatchTrigger`]
pub struct MockStore {
    values: Mutex<HashMap<String, u32>>,
    wakeups: Mutex<Option<mpsc::Receiver<Result<(), AccentError>>>>,
    refuse_watch: AtomicBool,
    arms: Arc<AtomicUsize>,
    waits: Arc<AtomicUsize>,
}

/// Test side of the mock change watch
pub struct WatchTrigger(mpsc::Sender<Result<(), AccentError>>);

impl WatchTrigger {
    pub fn fire(&self) {
        let _ = self.0.send(Ok(()));
    }

    pub fn fail(&self, reason: &str) {
        let _ = self.0.send(Err(AccentError::Watch(reason.to_string())));
    }
}

impl MockStore {
    pub fn new(values: &[(&str, u32)]) -> (Arc<Self>, WatchTrigger) {
        let (tx, rx) = mpsc::channel();
        let store = Self {
            values: Mutex::new(
                values
                    .iter()
                    .map(|(name, value)| (name.to_string(), *value))
                    .collect(),
            ),
            wakeups: Mutex::new(Some(rx)),
            refuse_watch: AtomicBool::new(false),
            arms: Arc::new(AtomicUsize::new(0)),
            waits: Arc::new(AtomicUsize::new(0)),
        };
        (Arc::new(store), WatchTrigger(tx))
    }

    pub fn set(&self, name: &str, value: u32) {
        self.values.lock().insert(name.to_string(), value);
    }

    pub fn remove(&self, name: &str) {
        self.values.lock().remove(name);
    }

    pub fn refuse_watch(&self) {
        self.refuse_watch.store(true, Ordering::SeqCst);
    }

    pub fn arms(&self) -> usize {
        self.arms.load(Ordering::SeqCst)
    }

    /// Number of times the watcher has blocked waiting for a change; it only
    /// waits again after the previous wakeup was handed to the engine
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

impl AccentStore for MockStore {
    fn location(&self) -> &str {
        r"MOCK\Software\Microsoft\Windows\DWM"
    }

    fn read_value(&self, name: &str) -> Result<u32, AccentError> {
        self.values
            .lock()
            .get(name)
            .copied()
            .ok_or_else(|| AccentError::ValueMissing {
                name: name.to_string(),
                code: 2,
            })
    }

    fn watch(&self) -> Result<Box<dyn ChangeWatch>, AccentError> {
        if self.refuse_watch.load(Ordering::SeqCst) {
            return Err(AccentError::Os {
                op: "CreateEventW",
                code: 8,
            });
        }
        let wakeups = self
            .wakeups
            .lock()
            .take()
            .ok_or_else(|| AccentError::Watch("already watched".into()))?;
        Ok(Box::new(ScriptedWatch {
            wakeups,
            arms: self.arms.clone(),
            waits: self.waits.clone(),
        }))
    }
}

struct ScriptedWatch {
    wakeups: mpsc::Receiver<Result<(), AccentError>>,
    arms: Arc<AtomicUsize>,
    waits: Arc<AtomicUsize>,
}

impl ChangeWatch for ScriptedWatch {
    fn arm(&mut self) -> Result<(), AccentError> {
        self.arms.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn wait(&mut self) -> Result<(), AccentError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        self.wakeups
            .recv()
            .unwrap_or_else(|_| Err(AccentError::Watch("trigger dropped".into())))
    }
}

/// Resolves to a fixed store, or fails when there is none
pub struct FixedResolver(pub Option<Arc<MockStore>>);

impl StoreResolver for FixedResolver {
    fn resolve(&self) -> Result<Arc<dyn AccentStore>, AccentError> {
        match &self.0 {
            Some(store) => Ok(store.clone() as Arc<dyn AccentStore>),
            None => Err(AccentError::NoActiveSession),
        }
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
