use actix_web::{web, App, HttpServer};
use clap::Parser;
use exam_chat::api::{self, AppState};
use exam_chat::cli::{commands::{Cli, Commands}, run_repl};
use exam_chat::config::AppConfig;
use exam_chat::llm::ProviderFactory;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Commands::Chat { mode, url, no_color } = cli.command {
        run_repl(config, mode, url, !no_color).await;
        return Ok(());
    }

    info!("Starting exam chat relay...");

    let provider = match ProviderFactory::create(&config) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to initialize LLM provider: {}", e);
            std::process::exit(1);
        }
    };

    let host = config.server.host.clone();
    let port = config.server.port;
    let endpoint = config.chat.endpoint.clone();
    let state = web::Data::new(AppState::new(provider, config.chat.clone()));

    info!("Server listening on {}:{} (chat endpoint {})", host, port, endpoint);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(actix_web::middleware::Logger::default())
            .configure(|cfg| api::configure(cfg, &endpoint))
    })
    .bind((host, port))?
    .run()
    .await
}
