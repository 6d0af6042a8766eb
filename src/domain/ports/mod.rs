//! Collaborator ports: the boundaries behind which external services
//! live. Adapters in `infrastructure` implement these traits.

pub mod code_generator;
pub mod source_repairer;
pub mod version_control;

pub use code_generator::{CodeGenerator, GeneratorError};
pub use source_repairer::SourceRepairer;
pub use version_control::{CommitOutcome, VcsError, VersionControl};
