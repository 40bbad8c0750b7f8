//! Generative-text boundary — the one external collaborator actions block
//! on. HTTP calls go through reqwest, Chat Completions shaped.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::config::Config;
use crate::error::GenerateError;

/// The narrow contract an action sees: system instructions plus rendered
/// context in, raw text out. Failures carry their own transience.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, input: &str) -> Result<String, GenerateError>;
}

// ── OpenAI-compatible Chat Completions ──

pub struct OpenAiGenerator {
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
    base_url: String,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            client: build_client(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            max_tokens: config.max_output_tokens,
        }
    }
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .expect("Failed to build HTTP client")
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, system: &str, input: &str) -> Result<String, GenerateError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let api_key = self.api_key.as_deref().unwrap_or("ollama"); // Ollama doesn't need a key

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": input},
            ],
            "max_tokens": self.max_tokens,
        });

        info!("chat_completions request: model={} url={}", self.model, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let data: serde_json::Value = response.json().await?;
        let text = data["choices"][0]["message"]
            .get("content")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        text.ok_or(GenerateError::Empty)
    }
}

// ── Scripted generator ──

/// Returns canned replies in order — the collaborator stand-in for tests
/// and offline demo sessions. Once the script runs dry it reports an empty
/// reply rather than wrapping around.
pub struct ScriptedGenerator {
    replies: std::sync::Mutex<std::collections::VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _system: &str, _input: &str) -> Result<String, GenerateError> {
        self.replies
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .ok_or(GenerateError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let generator = ScriptedGenerator::new(vec!["one".into(), "two".into()]);
        assert_eq!(generator.generate("s", "i").await.unwrap(), "one");
        assert_eq!(generator.generate("s", "i").await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_scripted_exhaustion_is_empty_error() {
        let generator = ScriptedGenerator::new(Vec::new());
        let err = generator.generate("s", "i").await.unwrap_err();
        assert!(matches!(err, GenerateError::Empty));
        assert!(err.is_transient());
    }
}
