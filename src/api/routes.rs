use actix_web::{
    error::{InternalError, JsonPayloadError},
    get,
    http::header,
    web, HttpRequest, HttpResponse,
};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::models::ChatTurnRequest;
use crate::api::prompts::build_provider_messages;
use crate::api::AppState;
use crate::sse::Frame;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

pub async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    warn!("Rejected {} {}", req.method(), req.path());
    HttpResponse::MethodNotAllowed().json(serde_json::json!({"error": "Method not allowed"}))
}

pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(serde_json::json!({"error": err.to_string()}));
    InternalError::from_response(err, response).into()
}

/// Relays one chat turn to the configured provider as an SSE stream.
///
/// The response is always `200 text/event-stream`. Upstream failures become a
/// single error frame, and `data: [DONE]` is always the last frame.
pub async fn chat(state: web::Data<AppState>, req: web::Json<ChatTurnRequest>) -> HttpResponse {
    let turn = req.into_inner();
    let mode = turn.mode();
    let messages = build_provider_messages(&turn.messages, mode, &state.chat.welcome_id);

    info!(
        "Relaying {} messages in {} mode via {} ({})",
        messages.len(),
        mode.as_str(),
        state.provider.name(),
        state.provider.model()
    );

    let (tx, mut rx) = mpsc::channel::<String>(100);
    let provider = state.provider.clone();
    let temperature = state.chat.temperature;

    let handle = tokio::spawn(async move {
        provider
            .stream_completion(&messages, temperature, tx)
            .await
    });

    let stream = async_stream::stream! {
        while let Some(delta) = rx.recv().await {
            if delta.is_empty() {
                continue;
            }
            yield Ok::<Bytes, actix_web::Error>(Bytes::from(Frame::Content(delta).encode()));
        }

        let failure = match handle.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!("Completion failed: {}", e);
                Some(e.to_string())
            }
            Err(e) => {
                error!("Relay task aborted: {}", e);
                Some("Internal relay error".to_string())
            }
        };

        if let Some(message) = failure {
            yield Ok::<Bytes, actix_web::Error>(Bytes::from(Frame::Error(message).encode()));
        }
        yield Ok::<Bytes, actix_web::Error>(Bytes::from(Frame::Done.encode()));
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONNECTION, "keep-alive"))
        .streaming(stream)
}
