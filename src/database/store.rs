use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewReview, Product, ProductDetails, Review};

/// Persistence seam for products and their reviews.
///
/// Every mutation goes through a [`ProductTx`] obtained from
/// [`ProductStore::lock_product`], which holds an exclusive lock on the
/// product until the transaction commits or is dropped.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError>;

    /// Reviews of a product, oldest first
    async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, DatabaseError>;

    /// Products rated at least `min_rating`, best first
    async fn top_rated(&self, min_rating: Decimal, limit: usize) -> Result<Vec<Product>, DatabaseError>;

    /// Insert a new product. Fails with `MissingReference` for an unknown category.
    async fn create_product(&self, product: Product) -> Result<Product, DatabaseError>;

    /// Delete a product together with its reviews, waiting for any
    /// transaction holding its lock. Returns `false` when it did not exist.
    async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Begin a transaction holding the product's row lock.
    /// Returns `Ok(None)` when the product does not exist.
    async fn lock_product(&self, id: Uuid) -> Result<Option<Box<dyn ProductTx>>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Unit of work scoped to one locked product.
///
/// Reads observe this transaction's own writes. Dropping without calling
/// [`ProductTx::commit`] discards every write.
#[async_trait]
pub trait ProductTx: Send {
    /// Current state of the locked product including uncommitted writes
    fn product(&self) -> &Product;

    async fn reviews(&mut self) -> Result<Vec<Review>, DatabaseError>;

    async fn has_review_from(&mut self, reviewer_id: Uuid) -> Result<bool, DatabaseError>;

    async fn insert_review(&mut self, review: NewReview) -> Result<Review, DatabaseError>;

    async fn set_aggregate(&mut self, rating: Decimal, reviews_num: i32) -> Result<(), DatabaseError>;

    async fn set_price(&mut self, price: Decimal) -> Result<(), DatabaseError>;

    async fn set_details(&mut self, details: &ProductDetails) -> Result<(), DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<Product, DatabaseError>;
}
