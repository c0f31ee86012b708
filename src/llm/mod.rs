//! Text Completion Service
//!
//! The chat dialogue is produced by an external completion service. This
//! module holds the collaborator interface, the OpenAI-compatible HTTP
//! client and an offline placeholder used for demos and tests.

pub mod error;
pub mod openai;
pub mod placeholder;
#[allow(clippy::module_inception)]
mod r#trait;
pub mod types;

pub use error::{ProviderError, Result};
pub use openai::OpenAiCompletion;
pub use placeholder::PlaceholderCompletion;
pub use r#trait::CompletionService;
pub use types::*;

use crate::config::LlmConfig;
use std::sync::Arc;

/// Build the completion service selected by configuration.
///
/// Only offline mode yields the placeholder service. Without an API key the
/// HTTP client is still returned and reports itself as unconfigured, so
/// callers decide how to handle the missing key.
pub fn create_service(config: &LlmConfig) -> Arc<dyn CompletionService> {
    if config.offline {
        tracing::info!("Using offline placeholder completion service");
        return Arc::new(PlaceholderCompletion::new());
    }
    if config.api_key.as_ref().is_none_or(|k| k.is_empty()) {
        tracing::warn!("No API key configured for {}", config.base_url);
    }
    tracing::info!("Using completion service at {} (model={})", config.base_url, config.model);
    Arc::new(OpenAiCompletion::from_config(config))
}
