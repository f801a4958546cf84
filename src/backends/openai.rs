//! OpenAI-compatible chat-completions backend.
//!
//! Also serves Groq, whose API is OpenAI-compatible; only the base URL and
//! default model differ.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use super::CompletionBackend;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const MAX_TOKENS: u32 = 2000;

/// Default OpenAI generation model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default Groq generation model
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Chat-completions backend for OpenAI-compatible APIs.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    name: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl OpenAiBackend {
    /// OpenAI backend with the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            name: "openai",
        }
    }

    /// Groq backend (OpenAI-compatible API, Groq base URL and model)
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GROQ_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            name: "groq",
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn send(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach {} API", self.name))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("{} API error ({}): {}", self.name, status, text);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to decode {} response", self.name))?;

        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("{} response contained no choices", self.name);
        }

        Ok(text)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(&self, prompt: &str, deadline: Duration) -> Result<String> {
        timeout(deadline, self.send(prompt))
            .await
            .with_context(|| format!("{} completion timed out after {:?}", self.name, deadline))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_variant() {
        let backend = OpenAiBackend::groq("key");
        assert_eq!(backend.name(), "groq");
        assert_eq!(backend.base_url, GROQ_BASE_URL);
        assert_eq!(backend.model, DEFAULT_GROQ_MODEL);
    }

    #[test]
    fn test_model_override() {
        let backend = OpenAiBackend::new("key").with_model("gpt-4o");
        assert_eq!(backend.model, "gpt-4o");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "result"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "result");
    }
}
