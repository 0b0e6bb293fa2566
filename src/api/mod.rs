pub mod models;
pub mod prompts;
pub mod routes;

use actix_web::web;
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::llm::LlmProvider;

/// Shared, read-only state of the relay. Every request is handled independently.
pub struct AppState {
    pub provider: Arc<dyn LlmProvider>,
    pub chat: ChatConfig,
}

impl AppState {
    pub fn new(provider: Arc<dyn LlmProvider>, chat: ChatConfig) -> Self {
        Self { provider, chat }
    }
}

/// Registers the health check and the chat relay under `chat_endpoint`.
pub fn configure(cfg: &mut web::ServiceConfig, chat_endpoint: &str) {
    cfg.service(routes::health).service(
        web::resource(chat_endpoint)
            .app_data(web::JsonConfig::default().error_handler(routes::json_error))
            .route(web::post().to(routes::chat))
            .default_service(web::to(routes::method_not_allowed)),
    );
}
