use super::code_generator::GeneratorError;
use async_trait::async_trait;
use std::path::Path;

/// Self-correction collaborator invoked after a worker crash.
///
/// Given the captured stderr of the crashed worker, the implementation
/// rewrites the worker source file in place (atomically). The only
/// promise is "attempted": the supervisor re-launches and observes the
/// result rather than trusting a return value.
#[async_trait]
pub trait SourceRepairer: Send + Sync {
    async fn repair(&self, source_path: &Path, stderr: &str) -> Result<(), GeneratorError>;
}
