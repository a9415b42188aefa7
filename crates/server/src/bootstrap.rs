use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;
use vendebot_core::config::{AppConfig, ConfigError, LoadOptions};
use vendebot_core::{DialogEngine, SessionStore};
use vendebot_db::{connect, migrations, DbPool, SqlCustomerDirectory, SqlSaleLedger};
use vendebot_telegram::{EventDispatcher, HttpTelegramTransport, TransportError};

/// Dispatcher specialized to the SQL-backed lookup and commit ports.
pub type Dispatcher = EventDispatcher<SqlCustomerDirectory, SqlSaleLedger>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("telegram transport init failed: {0}")]
    Transport(#[source] TransportError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        "database migrations applied"
    );

    let engine = DialogEngine::new(
        SqlCustomerDirectory::new(db_pool.clone()),
        SqlSaleLedger::new(db_pool.clone()),
    );
    let transport = HttpTelegramTransport::new(
        &config.telegram.api_base_url,
        config.telegram.bot_token.clone(),
        Duration::from_secs(config.telegram.timeout_secs),
    )
    .map_err(BootstrapError::Transport)?;
    let dispatcher = Arc::new(EventDispatcher::new(
        engine,
        SessionStore::new(),
        Arc::new(transport),
        config.telegram.allowed_chats.clone(),
    ));
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        allowed_chats = config.telegram.allowed_chats.len(),
        "telegram dispatcher wired"
    );

    Ok(Application { config, db_pool, dispatcher })
}
