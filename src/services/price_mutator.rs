use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::database::models::ProductView;
use crate::database::store::{ProductStore, ProductTx};
use crate::services::error::CatalogError;
use crate::services::money::{apply_markup, max_price};

/// Price writes. Every write applies the 10% markup: [`set_price`] to the
/// raw price handed in, `increase_price` to the price already stored, so
/// repeated increases compound.
#[derive(Clone)]
pub struct PriceMutator {
    store: Arc<dyn ProductStore>,
}

impl PriceMutator {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn increase_price(&self, product_id: Uuid) -> Result<ProductView, CatalogError> {
        let mut tx = self
            .store
            .lock_product(product_id)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(product_id))?;

        let previous = tx.product().price;
        let price = checked_price(apply_markup(previous))?;
        tx.set_price(price).await?;
        let reviews = tx.reviews().await?;
        let product = tx.commit().await?;

        info!("Price of product {} raised {} -> {}", product.id, previous, product.price);
        Ok(ProductView::new(product, reviews))
    }
}

/// Apply the write-time markup to a caller-supplied price
pub fn normalized_price(raw_price: Decimal) -> Result<Decimal, CatalogError> {
    if raw_price < Decimal::ZERO {
        return Err(CatalogError::InvalidPrice(format!(
            "price must not be negative (got {})",
            raw_price
        )));
    }
    checked_price(apply_markup(raw_price))
}

/// Store a caller-supplied price, marked up, inside an already locked
/// transaction. Returns the stored value.
#[instrument(skip_all, fields(raw_price = %raw_price))]
pub async fn set_price(tx: &mut dyn ProductTx, raw_price: Decimal) -> Result<Decimal, CatalogError> {
    let price = normalized_price(raw_price)?;
    tx.set_price(price).await?;
    Ok(price)
}

fn checked_price(price: Decimal) -> Result<Decimal, CatalogError> {
    if price > max_price() {
        return Err(CatalogError::InvalidPrice(format!(
            "price {} exceeds the maximum of {}",
            price,
            max_price()
        )));
    }
    Ok(price)
}
