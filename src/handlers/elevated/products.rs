// handlers/elevated/products.rs - staff-only product writes
//
// POST   /api/products            create; price gets the 10% markup
// PUT    /api/products/:id        full update; price gets the 10% markup
// DELETE /api/products/:id        remove the product and its reviews
// PUT    /api/products/:id/price  raise the stored price by 10%

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{ProductDetails, ProductView};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{PriceMutator, ProductService, ProductUpdate};

/// Body of product create and full update, using the storefront's client field names
#[derive(Debug, Deserialize)]
pub struct ProductUpdateRequest {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub brand: String,
    #[serde(rename = "countInStock")]
    pub count_in_stock: i32,
    pub category: Uuid,
    #[serde(default)]
    pub description: String,
}

impl From<ProductUpdateRequest> for ProductUpdate {
    fn from(req: ProductUpdateRequest) -> Self {
        ProductUpdate {
            details: ProductDetails {
                title: req.name,
                vendor: req.brand,
                stock_quantity: req.count_in_stock,
                category_id: req.category,
                description: req.description,
            },
            raw_price: req.price,
        }
    }
}

pub async fn product_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ProductUpdateRequest>, JsonRejection>,
) -> ApiResult<ProductView> {
    let Json(request) = payload?;

    let view = ProductService::new(state.store.clone())
        .create_product(user.user_id, request.into())
        .await?;

    Ok(ApiResponse::created(view))
}

pub async fn product_put(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ProductUpdateRequest>, JsonRejection>,
) -> ApiResult<ProductView> {
    let Json(request) = payload?;

    let view = ProductService::new(state.store.clone())
        .update_product(id, request.into())
        .await?;

    Ok(ApiResponse::success(view))
}

pub async fn product_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Value> {
    ProductService::new(state.store.clone()).delete_product(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

pub async fn price_put(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<ProductView> {
    let view = PriceMutator::new(state.store.clone()).increase_price(id).await?;
    Ok(ApiResponse::success(view))
}
