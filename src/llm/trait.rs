use super::error::Result;
use super::openai::FILLER_FALLBACK_TEXT;
use super::types::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;

/// External text-generation collaborator.
///
/// Implementations must be cheap to share across tasks; the game session
/// holds one behind an `Arc` and calls it from the scheduler task.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produce one completion for the given system prompt and history.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Service name (for logging).
    fn name(&self) -> &str;

    /// Model identifier reported in response metadata.
    fn model(&self) -> &str;

    /// Whether the service has what it needs to be called (e.g. an API key).
    fn is_configured(&self) -> bool {
        true
    }

    /// Short generic line for when a completion fails. Never errors.
    async fn filler(&self) -> String {
        FILLER_FALLBACK_TEXT.to_string()
    }
}
