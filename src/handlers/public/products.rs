// handlers/public/products.rs - GET /api/products/top and /api/products/:id handlers

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Product, ProductView};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ProductService;

/// Product with its reviews, oldest first
pub async fn product_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<ProductView> {
    let view = ProductService::new(state.store.clone()).get_product(id).await?;
    Ok(ApiResponse::success(view))
}

pub async fn products_top(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = ProductService::new(state.store.clone()).top_products().await?;
    Ok(ApiResponse::success(products))
}
