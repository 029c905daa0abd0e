use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toolchat_cli::{config::Config, identity, repl::Repl};
use toolchat_client::ClientFactory;
use toolchat_core::{DateLabeler, SessionManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    let identity = identity::resolve_identity(&config.identity)?;
    tracing::info!(user_id = %identity, backend = ?config.backend.kind, "Starting toolchat");

    let backend = ClientFactory::create_backend(&config.backend)?;
    let labeler = DateLabeler::new(config.display.utc_offset_minutes);
    let session = SessionManager::with_labeler(Arc::clone(&backend), identity, labeler);

    Repl::new(session, backend).run().await
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout belongs to the conversation
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
