//! Service layer: the supervision and evolution loops plus their
//! supporting components.

pub mod change_detector;
pub mod context;
pub mod history_log;
pub mod orchestrator;
pub mod snapshot_store;
pub mod supervisor;
pub mod validator;

pub use change_detector::Fingerprint;
pub use context::ContextAssembler;
pub use history_log::HistoryLog;
pub use orchestrator::EvolutionOrchestrator;
pub use snapshot_store::{SnapshotError, SnapshotStore};
pub use supervisor::{ProcessSupervisor, SupervisorError};
pub use validator::{FileKind, ValidationError, Validator};
