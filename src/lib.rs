//! Symbiont - self-healing supervision for a self-modifying worker.
//!
//! Symbiont keeps a long-running worker process alive, valid, and
//! versioned while its source is rewritten underneath it — by an
//! external edit or by an automated code-generation collaborator.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): pure models and collaborator ports
//! - **Service Layer** (`services`): the supervision and evolution loops
//! - **Infrastructure Layer** (`infrastructure`): Gemini, git, config,
//!   and filesystem adapters
//! - **CLI Layer** (`cli`): command-line interface
//!
//! Two independent loops run concurrently: the process supervisor polls
//! the worker for liveness and its source for changes, while the
//! evolution orchestrator drives propose → validate → apply → commit →
//! log iterations. Both replace files only via write-temp-then-rename.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, HistoryEntry, IterationStatus, Proposal, ProposalContext, Snapshot, WorkerEvent,
    WorkerState,
};
pub use domain::ports::{
    CodeGenerator, CommitOutcome, GeneratorError, SourceRepairer, VcsError, VersionControl,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::gemini::{GeminiClient, ProposalParser};
pub use infrastructure::git::GitClient;
pub use services::{
    EvolutionOrchestrator, HistoryLog, ProcessSupervisor, SnapshotStore, SupervisorError,
    Validator,
};
