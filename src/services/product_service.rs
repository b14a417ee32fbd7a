use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Product, ProductDetails, ProductView};
use crate::database::store::ProductStore;
use crate::services::error::CatalogError;
use crate::services::price_mutator::{normalized_price, set_price};

const MAX_TITLE_LEN: usize = 200;
const MAX_VENDOR_LEN: usize = 200;

/// Minimum rating for the top products listing
pub const TOP_RATING_THRESHOLD: i64 = 4;
pub const TOP_PRODUCTS_LIMIT: usize = 5;

/// Full set of a product's editable fields
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub details: ProductDetails,
    /// Caller-supplied price; the stored value gets the write-time markup
    pub raw_price: Decimal,
}

/// Reads products and applies full updates
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductView, CatalogError> {
        let product = self
            .store
            .find_product(product_id)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(product_id))?;
        let reviews = self.store.list_reviews(product_id).await?;
        Ok(ProductView::new(product, reviews))
    }

    /// Up to five products rated 4 or better, best first
    pub async fn top_products(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self
            .store
            .top_rated(Decimal::from(TOP_RATING_THRESHOLD), TOP_PRODUCTS_LIMIT)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self, update))]
    pub async fn create_product(&self, owner_id: Uuid, update: ProductUpdate) -> Result<ProductView, CatalogError> {
        validate_details(&update.details)?;
        let price = normalized_price(update.raw_price)?;

        let details = update.details;
        let category_id = details.category_id;
        let mut product = Product::new(details.title, price, category_id);
        product.vendor = details.vendor;
        product.stock_quantity = details.stock_quantity;
        product.description = details.description;
        product.owner_id = Some(owner_id);

        let product = self
            .store
            .create_product(product)
            .await
            .map_err(|e| missing_category(e, category_id))?;

        info!("Product {} created by {}", product.id, owner_id);
        Ok(ProductView::new(product, Vec::new()))
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), CatalogError> {
        if !self.store.delete_product(product_id).await? {
            return Err(CatalogError::product_not_found(product_id));
        }
        info!("Product {} deleted with its reviews", product_id);
        Ok(())
    }

    #[instrument(skip(self, update))]
    pub async fn update_product(&self, product_id: Uuid, update: ProductUpdate) -> Result<ProductView, CatalogError> {
        validate_details(&update.details)?;

        let mut tx = self
            .store
            .lock_product(product_id)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(product_id))?;

        let category_id = update.details.category_id;
        tx.set_details(&update.details)
            .await
            .map_err(|e| missing_category(e, category_id))?;
        set_price(&mut *tx, update.raw_price).await?;

        let reviews = tx.reviews().await?;
        let product = tx.commit().await?;

        info!("Product {} updated (price {})", product.id, product.price);
        Ok(ProductView::new(product, reviews))
    }
}

fn missing_category(err: DatabaseError, category_id: Uuid) -> CatalogError {
    match err {
        DatabaseError::MissingReference(_) => CatalogError::NotFound(format!("Category {} not found", category_id)),
        other => CatalogError::Database(other),
    }
}

fn validate_details(details: &ProductDetails) -> Result<(), CatalogError> {
    if details.title.trim().is_empty() {
        return Err(CatalogError::Validation("name must not be empty".to_string()));
    }
    if details.title.chars().count() > MAX_TITLE_LEN {
        return Err(CatalogError::Validation(format!(
            "name must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    if details.vendor.chars().count() > MAX_VENDOR_LEN {
        return Err(CatalogError::Validation(format!(
            "brand must be at most {} characters",
            MAX_VENDOR_LEN
        )));
    }
    if details.stock_quantity < 0 {
        return Err(CatalogError::Validation("countInStock must not be negative".to_string()));
    }
    Ok(())
}
