//! QuickyMessenger
//!
//! Main application entry point

use std::sync::Arc;
use anyhow::Context;
use tracing::{info, warn};

use QuickyMessenger::{
    config::{Settings, StorageBackend},
    database::{connection, ContentRepository, InMemoryContentRepository, PgContentRepository},
    handlers::{create_router, AppState, ConversationHandler},
    services::{MessengerClient, PayloadCipher, ReplySink},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", QuickyMessenger::info());

    let cipher = PayloadCipher::from_base64(&settings.storage.encryption_key)?;

    let repository: Arc<dyn ContentRepository> = match settings.storage.backend {
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let pool = connection::create_pool(&settings.database).await?;
            connection::run_migrations(&pool).await?;
            Arc::new(PgContentRepository::new(pool, cipher))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; content is lost on restart");
            Arc::new(InMemoryContentRepository::new(cipher))
        }
    };

    let messenger = MessengerClient::new(&settings.messenger, settings.timeouts.reply())?;
    if settings.messenger.setup_profile {
        if let Err(e) = messenger.setup_messenger_profile().await {
            warn!(error = %e, "Could not set up messenger profile");
        }
    }
    let replies: Arc<dyn ReplySink> = Arc::new(messenger);

    let handler = Arc::new(ConversationHandler::new(
        repository,
        replies,
        settings.timeouts.clone(),
    ));
    let app = create_router(Arc::new(AppState::new(
        handler,
        settings.messenger.verify_token.clone(),
    )));

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Webhook listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("QuickyMessenger has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
