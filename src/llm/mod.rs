pub mod models;
pub mod openai;
pub mod together;

use openai::OpenAiProvider;
use together::TogetherProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::Sender;

use crate::config::AppConfig;
use models::Message;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {status} {message}")]
    Api { status: u16, message: String },
    #[error("Stream Error: {0}")]
    Stream(String),
    #[error("Malformed Response: {0}")]
    Malformed(String),
    #[error("The model returned no completion")]
    EmptyCompletion,
    #[error("Configuration Error: {0}")]
    Config(String),
}

impl LlmError {
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let reason = status.canonical_reason().unwrap_or_default();
        let message = if text.is_empty() {
            reason.to_string()
        } else {
            format!("{}: {}", reason, text)
        };
        LlmError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// A chat completion backend that delivers its answer as text deltas.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Sends every delta of the completion on `tx`. Returns once the
    /// completion is fully delivered or has failed.
    async fn stream_completion(
        &self,
        messages: &[Message],
        temperature: f32,
        tx: Sender<String>,
    ) -> Result<(), LlmError>;
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        match config.llm.provider.as_str() {
            "together" => {
                let cfg = &config.llm.together;
                Ok(Arc::new(TogetherProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.model.clone(),
                    config.chat.chunk_size,
                    config.chat.chunk_delay(),
                )))
            }
            "openai" => {
                let cfg = &config.llm.openai;
                Ok(Arc::new(OpenAiProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.model.clone(),
                )))
            }
            other => Err(LlmError::Config(format!("unknown provider '{}'", other))),
        }
    }
}

/// Splits `text` into slices of at most `size` characters.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_counts_characters_not_bytes() {
        let chunks = chunk_text("Привет, мир", 4);
        assert_eq!(chunks, vec!["Прив", "ет, ", "мир"]);
    }

    #[test]
    fn chunk_text_empty_input_yields_nothing() {
        assert!(chunk_text("", 4).is_empty());
    }

    #[test]
    fn chunk_text_concatenation_is_lossless() {
        let text = "fn main() {\n    println!(\"hi\");\n}";
        let chunks = chunk_text(text, 4);
        assert_eq!(chunks.len(), (text.chars().count() + 3) / 4);
        assert_eq!(chunks.concat(), text);
    }
}
