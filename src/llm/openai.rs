use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc::Sender;

use crate::llm::{
    models::{CompletionRequest, Message},
    LlmError, LlmProvider,
};
use crate::sse::{Payload, SseDecoder};

/// Forwards the upstream event-stream delta by delta.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            stream: true,
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

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        // A reply with neither a delta nor the sentinel is not a completion.
        let mut answered = false;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| LlmError::Network(e.to_string()))?;
            for data in decoder.push(&bytes) {
                if forward(&data, &tx, &mut answered).await? {
                    return Ok(());
                }
            }
        }
        if let Some(data) = decoder.finish() {
            if forward(&data, &tx, &mut answered).await? {
                return Ok(());
            }
        }

        if answered {
            Ok(())
        } else {
            Err(LlmError::EmptyCompletion)
        }
    }
}

/// Handles one upstream payload. Returns true when the completion is over.
async fn forward(data: &str, tx: &Sender<String>, answered: &mut bool) -> Result<bool, LlmError> {
    match Payload::parse(data) {
        Payload::Done => {
            *answered = true;
            Ok(true)
        }
        Payload::Delta(content) => {
            *answered = true;
            // Receiver gone means the client left; stop reading.
            Ok(tx.send(content).await.is_err())
        }
        Payload::Error(message) => Err(LlmError::Stream(message)),
        Payload::Ignored => Ok(false),
    }
}
