//! Extraction backend interfaces.
//!
//! The core is backend-agnostic: one text-in, text-out completion call.
//! Prompt construction and response parsing live in the synthesis layer;
//! backends only move text over the wire, bounded by the caller's timeout.

pub mod anthropic;
pub mod openai;
pub mod testing;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::ResolvedConfig;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;

/// A swappable chat-completion backend.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &str;

    /// Run one completion over the prompt, bounded by `timeout`.
    ///
    /// Exactly one outbound call per invocation; no retries.
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String>;
}

/// Select a backend from configuration.
///
/// Honors an explicit `GLIDE_BACKEND` choice first, then falls back to
/// whichever credentials are present (Anthropic, then OpenAI, then Groq).
/// Returns `None` when nothing is configured: the caller runs degraded.
pub fn from_config(config: &ResolvedConfig) -> Option<Arc<dyn CompletionBackend>> {
    let backend: Option<Arc<dyn CompletionBackend>> = match config.backend.as_deref() {
        Some("anthropic") => config
            .anthropic_api_key
            .clone()
            .map(|key| Arc::new(AnthropicBackend::new(key)) as _),
        Some("openai") => config
            .openai_api_key
            .clone()
            .map(|key| Arc::new(OpenAiBackend::new(key)) as _),
        Some("groq") => config
            .groq_api_key
            .clone()
            .map(|key| Arc::new(OpenAiBackend::groq(key)) as _),
        Some("none") => None,
        _ => {
            if let Some(key) = config.anthropic_api_key.clone() {
                Some(Arc::new(AnthropicBackend::new(key)) as _)
            } else if let Some(key) = config.openai_api_key.clone() {
                Some(Arc::new(OpenAiBackend::new(key)) as _)
            } else {
                config
                    .groq_api_key
                    .clone()
                    .map(|key| Arc::new(OpenAiBackend::groq(key)) as _)
            }
        }
    };

    match &backend {
        Some(b) => info!(backend = b.name(), "extraction backend configured"),
        None => info!("no extraction backend configured, running degraded"),
    }

    backend
}
