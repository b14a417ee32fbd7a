use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::review::Review;

pub const DEFAULT_PICTURE: &str = "/img/default_prod_img.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub picture: String,
    pub price: Decimal,
    pub description: String,
    pub vendor: String,
    /// Mean of all review ratings, 0.00 while unreviewed
    pub rating: Decimal,
    pub reviews_num: i32,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub category_id: Uuid,
    pub owner_id: Option<Uuid>,
}

impl Product {
    /// A fresh, unreviewed product with the storefront's defaults
    pub fn new(title: impl Into<String>, price: Decimal, category_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            picture: DEFAULT_PICTURE.to_string(),
            price,
            description: String::new(),
            vendor: String::new(),
            rating: Decimal::new(0, 2),
            reviews_num: 0,
            stock_quantity: 0,
            created_at: Utc::now(),
            category_id,
            owner_id: None,
        }
    }
}

/// Editable product fields replaced by a full update; price travels separately
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub title: String,
    pub vendor: String,
    pub stock_quantity: i32,
    pub category_id: Uuid,
    pub description: String,
}

/// Product together with its reviews, as returned to API callers
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
}

impl ProductView {
    pub fn new(product: Product, reviews: Vec<Review>) -> Self {
        Self { product, reviews }
    }
}
