use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use paverly_core::config::{AppConfig, ConfigError, LoadOptions};
use paverly_db::{connect_with_settings, migrations, DbPool};
use paverly_vision::{GenerativeImageClient, VisionClient, VisionError};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub vision: Option<Arc<dyn VisionClient>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("vision client initialization failed: {0}")]
    Vision(#[source] VisionError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
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
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let vision: Option<Arc<dyn VisionClient>> = if config.vision.api_key.is_some() {
        let client =
            GenerativeImageClient::from_config(&config.vision).map_err(BootstrapError::Vision)?;
        Some(Arc::new(client))
    } else {
        info!(
            event_name = "system.bootstrap.vision_unconfigured",
            "no vision api key configured; simulation endpoints will report unavailable"
        );
        None
    };

    Ok(Application { config, db_pool, vision })
}
