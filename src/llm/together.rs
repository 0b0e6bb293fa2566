use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::debug;

use crate::llm::{
    chunk_text,
    models::{CompletionRequest, Message},
    LlmError, LlmProvider,
};

/// Requests a complete answer and replays it in small slices so the client
/// still sees incremental output.
pub struct TogetherProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl TogetherProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        chunk_size: usize,
        chunk_delay: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
            chunk_size,
            chunk_delay,
        }
    }

    async fn complete(&self, messages: &[Message], temperature: f32) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::from_response(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| LlmError::Malformed(e.to_string()))?;

        let choices = json["choices"]
            .as_array()
            .filter(|choices| !choices.is_empty())
            .ok_or(LlmError::EmptyCompletion)?;

        Ok(choices[0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl LlmProvider for TogetherProvider {
    fn name(&self) -> &str {
        "together"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream_completion(
        &self,
        messages: &[Message],
        temperature: f32,
        tx: Sender<String>,
    ) -> Result<(), LlmError> {
        let content = self.complete(messages, temperature).await?;
        let chunks = chunk_text(&content, self.chunk_size);
        debug!("Replaying {} chars as {} chunks", content.chars().count(), chunks.len());

        for (i, chunk) in chunks.into_iter().enumerate() {
            if i > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            if tx.send(chunk).await.is_err() {
                // Receiver dropped, nobody is listening anymore
                break;
            }
        }

        Ok(())
    }
}
