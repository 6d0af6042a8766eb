//! Domain models: pure data types with no I/O.

pub mod config;
pub mod history;
pub mod proposal;
pub mod snapshot;
pub mod worker;

pub use config::{
    Config, ContextConfig, EvolutionConfig, GeneratorConfig, HistoryConfig, LoggingConfig,
    SnapshotConfig, WorkerConfig,
};
pub use history::{HistoryEntry, IterationStatus};
pub use proposal::{Proposal, ProposalContext};
pub use snapshot::Snapshot;
pub use worker::{WorkerEvent, WorkerState};
