mod auth;
mod bootstrap;
mod health;
mod webhook;

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use tracing::{error, info};
use vendebot_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use vendebot_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    let router = webhook::router(webhook::WebhookState::new(
        app.dispatcher.clone(),
        app.config.telegram.webhook_secret.clone(),
    ))
    .merge(health::router(app.db_pool.clone()));

    serve(&app.config.server.bind_address, app.config.server.port, router).await?;

    info!(
        event_name = "system.server.started",
        webhook_path = "/telegram/webhook",
        "vendebot-server started"
    );
    wait_for_shutdown().await?;
    info!(event_name = "system.server.stopping", "vendebot-server stopping");

    Ok(())
}

async fn serve(bind_address: &str, port: u16, router: Router) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.server.listening",
        bind_address = %address,
        "webhook endpoint started"
    );

    tokio::spawn(async move {
        let service = router.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(error) = axum::serve(listener, service).await {
            error!(
                event_name = "system.server.error",
                error = %error,
                "webhook server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
