//! HTTP client for the Gemini generation API.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::domain::models::{GeneratorConfig, ProposalContext};
use crate::domain::ports::{CodeGenerator, GeneratorError, SourceRepairer};
use crate::infrastructure::fs::write_atomic;

/// Client for the Gemini `generateContent` REST API.
///
/// Implements both collaborator ports: proposal generation for the
/// evolution loop and source repair for the supervisor. Requests carry
/// a hard timeout; retrying is the caller's policy, not the client's.
pub struct GeminiClient {
    http_client: ReqwestClient,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from configuration, reading the API key from the
    /// environment variable named there.
    pub fn from_config(config: &GeneratorConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!(
                "{} is not set; the generation collaborator needs an API key",
                config.api_key_env
            )
        })?;
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            api_key,
            config.timeout_secs,
        )
    }

    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| anyhow::anyhow!("Failed to build HTTP client: {err}"))?;

        Ok(Self {
            http_client,
            base_url,
            model,
            api_key,
        })
    }

    async fn generate(&self, prompt: String) -> Result<String, GeneratorError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(model = %self.model, prompt_bytes = prompt.len(), "sending generation request");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|err| GeneratorError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error response".to_string());
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GeneratorError::Transport(format!("malformed response body: {err}")))?;

        match parsed.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GeneratorError::EmptyResponse),
        }
    }

    fn proposal_prompt(ctx: &ProposalContext) -> String {
        let user_request = ctx.user_request.as_deref().unwrap_or("None pending.");
        format!(
            "You are a senior software engineer continuously improving the worker \
             source below, guided by the outcomes of earlier iterations.\n\
             \n\
             RULES:\n\
             1. Analyze the request, the current source, and the iteration history.\n\
             2. Reply with a SINGLE JSON object with exactly these keys:\n\
                - \"filepath\": path of the file to replace\n\
                - \"content\": the complete new content of that file\n\
                - \"description\": one short sentence describing the change\n\
             3. Reply with nothing else: no explanation, no markdown around the JSON.\n\
             \n\
             ITERATION HISTORY:\n{history}\n\
             \n\
             PENDING USER REQUEST:\n{user_request}\n\
             \n\
             CURRENT SOURCE:\n{source}\n",
            history = ctx.history_summary,
            source = ctx.source_context,
        )
    }

    fn repair_prompt(source: &str, stderr: &str) -> String {
        format!(
            "You are a debugging expert. The program below crashed. Analyze the \
             source and the error output, then rewrite the whole file fixed.\n\
             RULES: reply with the complete corrected source only. No explanation, \
             no markdown.\n\
             \n\
             ERROR OUTPUT:\n{stderr}\n\
             \n\
             CRASHED SOURCE:\n{source}\n\
             \n\
             CORRECTED SOURCE:\n",
        )
    }

    /// Drop a surrounding markdown fence if the model added one.
    fn strip_code_fences(text: &str) -> &str {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix("```") else {
            return trimmed;
        };
        let Some(body) = rest.strip_suffix("```") else {
            return trimmed;
        };
        // Skip the language tag on the opening fence line.
        match body.split_once('\n') {
            Some((_, content)) => content.trim_end(),
            None => body.trim(),
        }
    }
}

#[async_trait]
impl CodeGenerator for GeminiClient {
    #[instrument(skip(self, ctx))]
    async fn propose(&self, ctx: &ProposalContext) -> Result<String, GeneratorError> {
        let raw = self.generate(Self::proposal_prompt(ctx)).await?;
        debug!(response_bytes = raw.len(), "received proposal response");
        Ok(raw)
    }
}

#[async_trait]
impl SourceRepairer for GeminiClient {
    #[instrument(skip(self, stderr), fields(source = %source_path.display()))]
    async fn repair(&self, source_path: &Path, stderr: &str) -> Result<(), GeneratorError> {
        let failed_source = tokio::fs::read_to_string(source_path).await?;
        let raw = self
            .generate(Self::repair_prompt(&failed_source, stderr))
            .await?;

        let fixed = Self::strip_code_fences(&raw);
        if fixed.trim().is_empty() {
            warn!("repair response was empty after stripping fences");
            return Err(GeneratorError::EmptyResponse);
        }

        write_atomic(source_path, fixed.as_bytes()).await?;
        info!("rewrote worker source with repair attempt");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language_tag() {
        let raw = "```python\nprint('ok')\n```";
        assert_eq!(GeminiClient::strip_code_fences(raw), "print('ok')");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\nx = 1\n```";
        assert_eq!(GeminiClient::strip_code_fences(raw), "x = 1");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(GeminiClient::strip_code_fences("x = 1\n"), "x = 1");
    }

    #[test]
    fn proposal_prompt_mentions_pending_request() {
        let ctx = ProposalContext {
            source_context: "--- File: a.py ---\n".to_string(),
            history_summary: "No history yet.".to_string(),
            user_request: Some("add a health check".to_string()),
        };
        let prompt = GeminiClient::proposal_prompt(&ctx);
        assert!(prompt.contains("add a health check"));
        assert!(prompt.contains("No history yet."));
    }
}
