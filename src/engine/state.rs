//! Engine lifecycle states

use std::fmt;

/// Lifecycle of the sync engine
///
/// ```text
/// Uninitialized -> Locating -> ChannelOpen -> StoreResolved -> Synced <-> Watching
///                                                  any state -> Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Locating,
    ChannelOpen,
    StoreResolved,
    Synced,
    Watching,
    Stopped,
}

impl EngineState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Locating => "LOCATING",
            Self::ChannelOpen => "CHANNEL_OPEN",
            Self::StoreResolved => "STORE_RESOLVED",
            Self::Synced => "SYNCED",
            Self::Watching => "WATCHING",
            Self::Stopped => "STOPPED",
        }
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: EngineState) -> bool {
        use EngineState::*;
        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Uninitialized, Locating)
            | (Locating, ChannelOpen)
            | (ChannelOpen, StoreResolved)
            | (StoreResolved, Synced)
            | (StoreResolved, Watching)
            | (Synced, Watching)
            | (Watching, Synced) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Stopped
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the engine left its event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop requested by the host (Ctrl-C, service stop)
    Requested,
    /// The change-notification wait failed at the OS level
    WatchFailed,
    /// The device channel is no longer open
    DeviceLost,
    /// Every event sender was dropped
    EventsClosed,
}

impl StopReason {
    /// Exit code reported when the host stops for this reason
    pub fn exit_code(self) -> u32 {
        match self {
            Self::Requested | Self::EventsClosed => 0,
            Self::WatchFailed | Self::DeviceLost => 1,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Requested => "stop requested",
            Self::WatchFailed => "accent watch failed",
            Self::DeviceLost => "device channel closed",
            Self::EventsClosed => "event channel closed",
        };
        f.write_str(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineState::*;
    use super::*;

    const ALL: [EngineState; 7] = [
        Uninitialized,
        Locating,
        ChannelOpen,
        StoreResolved,
        Synced,
        Watching,
        Stopped,
    ];

    #[test]
    fn test_startup_path() {
        assert!(Uninitialized.can_transition_to(Locating));
        assert!(Locating.can_transition_to(ChannelOpen));
        assert!(ChannelOpen.can_transition_to(StoreResolved));
        assert!(StoreResolved.can_transition_to(Synced));
    }

    #[test]
    fn test_sync_watch_alternate() {
        assert!(Synced.can_transition_to(Watching));
        assert!(Watching.can_transition_to(Synced));
        // Initial sync skipped because the accent was unreadable
        assert!(StoreResolved.can_transition_to(Watching));
    }

    #[test]
    fn test_stopped_reachable_from_every_live_state() {
        for state in ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(state.can_transition_to(Stopped), "{state} -> STOPPED");
        }
    }

    #[test]
    fn test_stopped_is_terminal() {
        for state in ALL {
            assert!(!Stopped.can_transition_to(state));
        }
    }

    #[test]
    fn test_no_skipping_startup_steps() {
        assert!(!Uninitialized.can_transition_to(ChannelOpen));
        assert!(!Locating.can_transition_to(StoreResolved));
        assert!(!ChannelOpen.can_transition_to(Watching));
        assert!(!Watching.can_transition_to(Locating));
    }
}
