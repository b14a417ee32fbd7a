use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::app::{build_app, AppState};
use crate::config::AppConfig;
use crate::database::models::{Category, Product};
use crate::database::{DatabaseManager, MemoryProductStore, PgProductStore, ProductStore};

pub async fn handle(mut config: AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.api.port = port;
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
    }

    if config.is_development() {
        warn!("Running with development defaults; set APP_ENV for staging or production");
    }

    let store: Arc<dyn ProductStore> = if memory {
        Arc::new(seeded_memory_store()?)
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        if config.database.run_migrations {
            DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;
        }
        Arc::new(PgProductStore::new(pool))
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    info!("Starting Storefront API in {:?} mode", config.environment);

    let app = build_app(AppState::new(store, config));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Storefront API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn seeded_memory_store() -> anyhow::Result<MemoryProductStore> {
    let store = MemoryProductStore::new();
    let category = Category::new("Demo");
    store.insert_category(&category)?;

    let mut product = Product::new("Demo product", Decimal::new(1000, 2), category.id);
    product.vendor = "Storefront".to_string();
    product.stock_quantity = 10;
    info!("In-memory store seeded with product {}", product.id);
    store.insert_product(product)?;

    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
