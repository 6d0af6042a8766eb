//! Worker lifecycle state machine.
//!
//! The supervisor drives the worker through an explicit state machine
//! rather than exception-driven control flow, so every transition can be
//! tested in isolation from process management.

use std::fmt;

/// Lifecycle state of the supervised worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No worker process exists.
    NotRunning,
    /// The worker process is alive.
    Running,
    /// The worker is being torn down and relaunched.
    Restarting,
    /// Rollback was impossible; the supervisor has given up.
    FailedTerminal,
}

/// Observation that drives a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    /// A worker process was spawned successfully.
    Launched,
    /// The source fingerprint changed while the worker was running.
    SourceChanged,
    /// The worker exited with a non-zero code.
    Crashed,
    /// The worker exited with code zero.
    CleanExit,
    /// A rollback was required but no snapshot exists, or restoring it
    /// failed.
    RollbackImpossible,
    /// An external stop was requested.
    Stopped,
}

impl WorkerState {
    /// Pure transition function.
    ///
    /// Unexpected event/state pairs leave the state unchanged;
    /// `FailedTerminal` absorbs everything except nothing — it is final.
    #[must_use]
    pub fn next(self, event: WorkerEvent) -> Self {
        use WorkerEvent::{
            CleanExit, Crashed, Launched, RollbackImpossible, SourceChanged, Stopped,
        };
        use WorkerState::{FailedTerminal, NotRunning, Restarting, Running};

        match (self, event) {
            (FailedTerminal, _) => FailedTerminal,
            (_, Stopped) => NotRunning,
            (_, RollbackImpossible) => FailedTerminal,
            (NotRunning | Restarting, Launched) => Running,
            (Running, SourceChanged | Crashed | CleanExit) => Restarting,
            (state, _) => state,
        }
    }

    /// Whether the supervisor loop should keep polling in this state.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::FailedTerminal | Self::NotRunning)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotRunning => "not_running",
            Self::Running => "running",
            Self::Restarting => "restarting",
            Self::FailedTerminal => "failed_terminal",
        };
        write!(f, "{name}")
    }
}
