use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error};

use crate::chat::session::{ChatSession, PendingTurn};
use crate::sse::{Payload, SseDecoder};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Relay returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("A turn is already in progress or the message is empty")]
    Rejected,
}

/// Sends chat turns to the relay and streams the answers into a session.
pub struct RelayClient {
    http: Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Runs one turn to completion. `on_update` is called after every delta
    /// with the session and the newly received text.
    ///
    /// The session is never left busy: it ends idle, or showing the error.
    pub async fn submit<F>(
        &self,
        session: &mut ChatSession,
        input: &str,
        on_update: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&ChatSession, &str),
    {
        let turn = session.begin_turn(input).ok_or(ClientError::Rejected)?;

        match self.run_turn(session, &turn, on_update).await {
            Ok(()) => {
                session.finish();
                Ok(())
            }
            Err(e) => {
                error!("Chat turn failed: {}", e);
                session.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_turn<F>(
        &self,
        session: &mut ChatSession,
        turn: &PendingTurn,
        on_update: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&ChatSession, &str),
    {
        let response = self.http.post(&self.url).json(&turn.request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        consume_stream(response.bytes_stream(), session, &turn.assistant_id, on_update).await?;
        Ok(())
    }
}

/// Reads relay frames into the assistant placeholder `assistant_id`.
///
/// Deltas are accumulated and the placeholder is replaced with the full text
/// after each one. Reading stops at `[DONE]` or when the stream ends.
pub async fn consume_stream<S, E, F>(
    stream: S,
    session: &mut ChatSession,
    assistant_id: &str,
    mut on_update: F,
) -> Result<(), E>
where
    S: Stream<Item = Result<Bytes, E>>,
    F: FnMut(&ChatSession, &str),
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = SseDecoder::new();
    let mut accumulated = String::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        for data in decoder.push(&bytes) {
            if !apply_payload(&data, session, assistant_id, &mut accumulated, &mut on_update) {
                return Ok(());
            }
        }
    }

    if let Some(data) = decoder.finish() {
        apply_payload(&data, session, assistant_id, &mut accumulated, &mut on_update);
    }
    Ok(())
}

/// Returns false once the terminal sentinel has been seen.
fn apply_payload<F>(
    data: &str,
    session: &mut ChatSession,
    assistant_id: &str,
    accumulated: &mut String,
    on_update: &mut F,
) -> bool
where
    F: FnMut(&ChatSession, &str),
{
    match Payload::parse(data) {
        Payload::Done => return false,
        Payload::Delta(delta) => {
            accumulated.push_str(&delta);
            session.apply_delta(assistant_id, accumulated);
            on_update(session, &delta);
        }
        Payload::Error(message) => {
            debug!("Relay reported an error: {}", message);
            session.record_error(message);
        }
        Payload::Ignored => {}
    }
    true
}
