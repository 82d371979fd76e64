//! Console close, logoff and shutdown for the foreground engine
//!
//! Windows terminates a console process as soon as the handler for these
//! events returns, so the handler asks the engine to stop and waits for its
//! [`StopLatch`] before returning. Ctrl-C and Ctrl-Break are left to the
//! next handler in the chain.

use std::io;
use std::time::Duration;

use crate::engine::{EventSender, StopLatch};

/// Longest wait for the reset; the OS allows about five seconds on close
pub const STOP_GRACE: Duration = Duration::from_secs(4);

#[cfg(windows)]
mod imp {
    use std::io;
    use std::sync::OnceLock;

    use tracing::warn;
    use windows_sys::Win32::Foundation::{BOOL, FALSE, TRUE};
    use windows_sys::Win32::System::Console::{
        SetConsoleCtrlHandler, CTRL_CLOSE_EVENT, CTRL_LOGOFF_EVENT, CTRL_SHUTDOWN_EVENT,
    };

    use super::STOP_GRACE;
    use crate::engine::{EngineEvent, EventSender, StopLatch};

    struct ConsoleStop {
        events: EventSender,
        stopped: StopLatch,
    }

    static CONSOLE_STOP: OnceLock<ConsoleStop> = OnceLock::new();

    pub(super) fn install(events: EventSender, stopped: StopLatch) -> io::Result<()> {
        if CONSOLE_STOP.set(ConsoleStop { events, stopped }).is_err() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "console close handler already installed",
            ));
        }
        if unsafe { SetConsoleCtrlHandler(Some(close_handler), TRUE) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    unsafe extern "system" fn close_handler(ctrl_type: u32) -> BOOL {
        if !matches!(
            ctrl_type,
            CTRL_CLOSE_EVENT | CTRL_LOGOFF_EVENT | CTRL_SHUTDOWN_EVENT
        ) {
            return FALSE;
        }
        let Some(stop) = CONSOLE_STOP.get() else {
            return FALSE;
        };

        let _ = stop.events.send(EngineEvent::Stop);
        if !stop.stopped.wait_timeout(STOP_GRACE) {
            warn!("Engine did not stop within {:?}", STOP_GRACE);
        }
        TRUE
    }
}

/// Make console close, logoff and shutdown stop the engine and wait for its
/// reset before the process is torn down
#[cfg(windows)]
pub fn install_close_handler(events: EventSender, stopped: StopLatch) -> io::Result<()> {
    imp::install(events, stopped)
}

/// Termination signals other than Ctrl-C are not handled off Windows
#[cfg(not(windows))]
pub fn install_close_handler(_events: EventSender, _stopped: StopLatch) -> io::Result<()> {
    Ok(())
}
