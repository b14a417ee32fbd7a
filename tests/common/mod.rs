#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use uuid::Uuid;

use storefront_api::app::{build_app, AppState};
use storefront_api::auth::{generate_jwt, Claims};
use storefront_api::config::{AppConfig, Environment};
use storefront_api::database::models::{Category, Product};
use storefront_api::database::MemoryProductStore;

/// Router running in-process on an ephemeral port, backed by an in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryProductStore>,
    pub category: Category,
    pub product: Product,
    config: AppConfig,
}

impl TestServer {
    /// Start a server with one product priced at `price`
    pub async fn spawn_with_price(price: Decimal) -> Result<Self> {
        let store = MemoryProductStore::new();
        let category = Category::new("Electronics");
        store.insert_category(&category)?;
        let product = Product::new("Test product", price, category.id);
        store.insert_product(product.clone())?;
        let store = Arc::new(store);

        let mut config = AppConfig::for_environment(Environment::Development);
        config.api.enable_request_logging = false;
        let app = build_app(AppState::new(store.clone(), config.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind ephemeral port")?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            store,
            category,
            product,
            config,
        })
    }

    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_price(Decimal::new(1000, 2)).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn product_url(&self, suffix: &str) -> String {
        self.url(&format!("/api/products/{}{}", self.product.id, suffix))
    }

    /// Bearer header value for a fresh user
    pub fn token(&self, name: &str, is_staff: bool) -> String {
        self.token_for(Uuid::new_v4(), name, is_staff)
    }

    pub fn token_for(&self, user_id: Uuid, name: &str, is_staff: bool) -> String {
        let claims = Claims::new(user_id, name.to_lowercase(), name.to_string(), is_staff, 1);
        let jwt = generate_jwt(&claims, &self.config.security.jwt_secret).expect("sign test token");
        format!("Bearer {}", jwt)
    }
}
