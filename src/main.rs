use std::sync::Arc;
use tracing::info;

mod agent;
mod bus;
mod chat;
mod config;
mod corpus;
mod fallback;
mod interface;
mod reveal;
mod session;
mod share;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        // It's not fatal if .env doesn't exist, but good to know
        info!("No .env file found or failed to load: {}", e);
    }

    // Initialize logging with default filter if RUST_LOG is not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("iChatrobo engine starting...");

    let config = config::Config::from_env()?;

    info!("Loading corpus from {}", config.corpus_path.display());
    let corpus = corpus::Corpus::load(&config.corpus_path, config.corpus_limit).await?;

    let bus = Arc::new(bus::EventBus::new());
    let backend = Arc::new(agent::client::AnswerClient::new(&config)?);
    let engine = session::Engine::new(backend, corpus, bus.clone());

    let server = interface::http::WidgetServer::new(engine, bus, config.page_url.clone());
    let app = server.router();

    info!("Starting widget server on port {}", config.port);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        res = axum::serve(listener, app) => {
            if let Err(e) = res {
                info!("Server stopped with error: {}", e);
            }
        }
    }

    Ok(())
}
