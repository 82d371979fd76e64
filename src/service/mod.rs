//! Windows service host
//!
//! The service control manager starts the process, calls the service main on
//! a dispatcher-owned thread and delivers controls to [`control_handler`] on
//! yet another. Controls are forwarded to the engine as events; the engine
//! thread stays the only one touching the keyboard.

mod status;

#[cfg(windows)]
mod install;

pub use status::{ServiceState, StatusReport, StatusTracker, START_WAIT_HINT_MS};

#[cfg(windows)]
pub use install::install;

#[cfg(not(windows))]
pub fn install() -> Result<(), ServiceError> {
    Err(ServiceError::Unsupported)
}

use thiserror::Error;

/// Service key name
pub const SERVICE_NAME: &str = "SteelSeriesSvc";

/// Name shown in the services console
pub const DISPLAY_NAME: &str = "SteelSeries Integration Service";

/// `ERROR_FAILED_SERVICE_CONTROLLER_CONNECT`: the process was started from a
/// console rather than by the service control manager
pub const ERROR_FAILED_SERVICE_CONTROLLER_CONNECT: u32 = 1063;

/// How a dispatch attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The service ran and has stopped
    Served,
    /// Not started by the service control manager; nothing to serve
    NotAService,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service {0} is already installed")]
    AlreadyInstalled(&'static str),

    #[error("{op} failed (os error {code:#010x})")]
    Os { op: &'static str, code: u32 },

    #[error("Service control manager is not available on this platform")]
    Unsupported,
}

impl ServiceError {
    pub fn os_code(&self) -> Option<u32> {
        match self {
            Self::Os { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(windows)]
pub use host::dispatch;

#[cfg(not(windows))]
pub fn dispatch() -> Result<Dispatch, ServiceError> {
    Ok(Dispatch::NotAService)
}

/// Classify a `StartServiceCtrlDispatcherW` failure
pub fn dispatch_failure(code: u32) -> Result<Dispatch, ServiceError> {
    match code {
        ERROR_FAILED_SERVICE_CONTROLLER_CONNECT => Ok(Dispatch::NotAService),
        code => Err(ServiceError::Os {
            op: "StartServiceCtrlDispatcherW",
            code,
        }),
    }
}

#[cfg(windows)]
mod host {
    use std::ffi::c_void;
    use std::ptr::null_mut;
    use std::sync::OnceLock;

    use parking_lot::Mutex;
    use steelsvc_transport::HidDiscovery;
    use tracing::{error, info, warn};
    use windows_sys::core::PWSTR;
    use windows_sys::Win32::Foundation::{ERROR_CALL_NOT_IMPLEMENTED, NO_ERROR};
    use windows_sys::Win32::System::Services::{
        RegisterServiceCtrlHandlerExW, SetServiceStatus, StartServiceCtrlDispatcherW,
        SERVICE_CONTROL_INTERROGATE, SERVICE_CONTROL_SESSIONCHANGE, SERVICE_CONTROL_STOP,
        SERVICE_STATUS, SERVICE_STATUS_HANDLE, SERVICE_TABLE_ENTRYW, SERVICE_WIN32_OWN_PROCESS,
    };

    use super::status::{ServiceState, StatusTracker, START_WAIT_HINT_MS};
    use super::{dispatch_failure, Dispatch, ServiceError, SERVICE_NAME};
    use crate::accent::default_resolver;
    use crate::daemon;
    use crate::engine::{event_channel, EngineEvent, EventSender};
    use crate::session::SessionEvent;
    use crate::winutil::{last_error, to_wide};

    /// Hand the calling thread to the service control dispatcher
    ///
    /// Returns once the service has stopped, or immediately with
    /// [`Dispatch::NotAService`] when the process was started from a console.
    pub fn dispatch() -> Result<Dispatch, ServiceError> {
        let mut name = to_wide(SERVICE_NAME);
        let table = [
            SERVICE_TABLE_ENTRYW {
                lpServiceName: name.as_mut_ptr(),
                lpServiceProc: Some(service_main),
            },
            SERVICE_TABLE_ENTRYW {
                lpServiceName: null_mut(),
                lpServiceProc: None,
            },
        ];

        if unsafe { StartServiceCtrlDispatcherW(table.as_ptr()) } == 0 {
            return dispatch_failure(last_error());
        }
        Ok(Dispatch::Served)
    }

    struct StatusHandle(SERVICE_STATUS_HANDLE);

    // Status handles are process-wide and need no closing
    unsafe impl Send for StatusHandle {}
    unsafe impl Sync for StatusHandle {}

    #[derive(Default)]
    struct StatusReporter {
        handle: OnceLock<StatusHandle>,
        tracker: Mutex<StatusTracker>,
    }

    impl StatusReporter {
        fn set(&self, state: ServiceState, exit_code: u32, wait_hint: u32) {
            let Some(handle) = self.handle.get() else {
                return;
            };
            let report = self.tracker.lock().report(state, exit_code, wait_hint);
            let status = SERVICE_STATUS {
                dwServiceType: SERVICE_WIN32_OWN_PROCESS,
                dwCurrentState: report.state.code(),
                dwControlsAccepted: report.controls_accepted,
                dwWin32ExitCode: report.exit_code,
                dwServiceSpecificExitCode: 0,
                dwCheckPoint: report.checkpoint,
                dwWaitHint: report.wait_hint,
            };
            if unsafe { SetServiceStatus(handle.0, &status) } == 0 {
                warn!("SetServiceStatus({:?}) failed: {:#010x}", state, last_error());
            }
        }
    }

    struct ServiceContext {
        events: EventSender,
        status: StatusReporter,
    }

    unsafe extern "system" fn service_main(_argc: u32, _argv: *mut PWSTR) {
        if let Err(e) = run_service() {
            error!("Service failed: {}", e);
        }
    }

    fn run_service() -> Result<(), ServiceError> {
        let (events, rx) = event_channel();

        // The control handler may be invoked until the process exits
        let context: &'static ServiceContext = Box::leak(Box::new(ServiceContext {
            events: events.clone(),
            status: StatusReporter::default(),
        }));

        let name = to_wide(SERVICE_NAME);
        let handle = unsafe {
            RegisterServiceCtrlHandlerExW(
                name.as_ptr(),
                Some(control_handler),
                context as *const ServiceContext as *const c_void,
            )
        };
        if handle.is_null() {
            return Err(ServiceError::Os {
                op: "RegisterServiceCtrlHandlerExW",
                code: last_error(),
            });
        }
        let _ = context.status.handle.set(StatusHandle(handle));
        context
            .status
            .set(ServiceState::StartPending, NO_ERROR, START_WAIT_HINT_MS);

        let resolver = default_resolver();
        let result = daemon::run_blocking(&HidDiscovery::new(), &*resolver, events, rx, |_| {
            info!("Service running");
            context.status.set(ServiceState::Running, NO_ERROR, 0);
        });

        let exit_code = match result {
            Ok(reason) => reason.exit_code(),
            Err(e) => {
                error!("{}", e);
                e.exit_code()
            }
        };
        context.status.set(ServiceState::Stopped, exit_code, 0);
        Ok(())
    }

    unsafe extern "system" fn control_handler(
        control: u32,
        event_type: u32,
        _event_data: *mut c_void,
        context: *mut c_void,
    ) -> u32 {
        if context.is_null() {
            return ERROR_CALL_NOT_IMPLEMENTED;
        }
        let context = &*(context as *const ServiceContext);

        match control {
            SERVICE_CONTROL_STOP => {
                context.status.set(ServiceState::StopPending, NO_ERROR, 0);
                let _ = context.events.send(EngineEvent::Stop);
                NO_ERROR
            }
            SERVICE_CONTROL_SESSIONCHANGE => {
                if let Some(event) = SessionEvent::from_wts_code(event_type) {
                    let _ = context.events.send(EngineEvent::Session(event));
                }
                NO_ERROR
            }
            SERVICE_CONTROL_INTERROGATE => NO_ERROR,
            _ => ERROR_CALL_NOT_IMPLEMENTED,
        }
    }
}
