use anyhow::Result;
use guest_list_api::{
    app::{create_app, AppState},
    config::Config,
    middleware::{init_metrics, logging::init_logging},
    services::EmailNotificationGateway,
    storage::open_store,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging);
    init_metrics()?;

    info!("Starting Guest List API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        event = %config.event.label,
        allow_status_override = config.event.allow_status_override,
        scan_serialization = ?config.event.scan_serialization,
        "Event settings"
    );

    let opened = open_store(&config).await?;
    let notifier = Arc::new(EmailNotificationGateway::new(config.email.clone()));
    info!(
        enabled = notifier.is_enabled(),
        provider = %config.email.provider,
        "Approval email delivery"
    );
    let addr = config.socket_addr()?;

    let app = create_app(AppState::new(config, opened.store, notifier, opened.pool));

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
