//! Status bookkeeping for the service control manager

/// `SERVICE_STOPPED`
pub const SERVICE_STOPPED: u32 = 0x1;
/// `SERVICE_START_PENDING`
pub const SERVICE_START_PENDING: u32 = 0x2;
/// `SERVICE_STOP_PENDING`
pub const SERVICE_STOP_PENDING: u32 = 0x3;
/// `SERVICE_RUNNING`
pub const SERVICE_RUNNING: u32 = 0x4;

/// `SERVICE_ACCEPT_STOP`
pub const SERVICE_ACCEPT_STOP: u32 = 0x1;
/// `SERVICE_ACCEPT_SESSIONCHANGE`
pub const SERVICE_ACCEPT_SESSIONCHANGE: u32 = 0x80;

/// Wait hint sent with the initial start-pending report
pub const START_WAIT_HINT_MS: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    StartPending,
    Running,
    StopPending,
    Stopped,
}

impl ServiceState {
    pub fn code(self) -> u32 {
        match self {
            Self::StartPending => SERVICE_START_PENDING,
            Self::Running => SERVICE_RUNNING,
            Self::StopPending => SERVICE_STOP_PENDING,
            Self::Stopped => SERVICE_STOPPED,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::StartPending | Self::StopPending)
    }
}

/// One status update, field for field what `SetServiceStatus` receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub state: ServiceState,
    pub controls_accepted: u32,
    pub exit_code: u32,
    pub checkpoint: u32,
    pub wait_hint: u32,
}

/// Builds successive status reports
///
/// Session changes are always accepted; stop is accepted once start-up is
/// over. Pending states carry an increasing checkpoint, settled states
/// carry zero.
#[derive(Debug)]
pub struct StatusTracker {
    next_checkpoint: u32,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self { next_checkpoint: 1 }
    }
}

impl StatusTracker {
    pub fn report(&mut self, state: ServiceState, exit_code: u32, wait_hint: u32) -> StatusReport {
        let mut controls_accepted = SERVICE_ACCEPT_SESSIONCHANGE;
        if state != ServiceState::StartPending {
            controls_accepted |= SERVICE_ACCEPT_STOP;
        }

        let checkpoint = if state.is_pending() {
            let checkpoint = self.next_checkpoint;
            self.next_checkpoint = self.next_checkpoint.wrapping_add(1);
            checkpoint
        } else {
            0
        };

        StatusReport {
            state,
            controls_accepted,
            exit_code,
            checkpoint,
            wait_hint,
        }
    }
}
