use anyhow::Context;
use tracing::info;

use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;
    info!("Migrations applied");

    pool.close().await;
    Ok(())
}
