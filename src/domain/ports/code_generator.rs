use crate::domain::models::ProposalContext;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the generation collaborator.
///
/// All variants are treated as transient by callers: the orchestrator
/// retries a bounded number of times and the supervisor logs and moves
/// on.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("request to generation service failed: {0}")]
    Transport(String),

    #[error("generation service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generation service returned an empty response")]
    EmptyResponse,

    #[error("i/o while applying generated content: {0}")]
    Io(#[from] std::io::Error),
}

/// Code-generation collaborator: asked once per evolution iteration for
/// a change proposal.
///
/// Returns the raw model text; the response may arrive wrapped in prose
/// or fenced blocks, so extraction is the caller's job (see
/// `ProposalParser`).
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn propose(&self, ctx: &ProposalContext) -> Result<String, GeneratorError>;
}
