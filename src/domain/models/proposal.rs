use serde::{Deserialize, Serialize};

/// A candidate full replacement for a source file, produced by the
/// code-generation collaborator for one evolution iteration.
///
/// Proposals are transient: they are never persisted except indirectly
/// through the resulting commit and history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Target file path, relative to the repository root.
    pub filepath: String,
    /// Full replacement content for the target file.
    pub content: String,
    /// Human-readable description of the change.
    pub description: String,
}

/// Input handed to the code-generation collaborator when requesting a
/// proposal.
#[derive(Debug, Clone, Default)]
pub struct ProposalContext {
    /// Concatenated source of the worker, assembled by the context
    /// walker.
    pub source_context: String,
    /// Formatted summary of the most recent history entries.
    pub history_summary: String,
    /// Pending free-text user request, if one was queued.
    pub user_request: Option<String>,
}
