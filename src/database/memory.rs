use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Category, NewReview, Product, ProductDetails, Review};
use crate::database::store::{ProductStore, ProductTx};

#[derive(Debug, Default)]
struct Tables {
    categories: HashSet<Uuid>,
    products: HashMap<Uuid, Product>,
    reviews: Vec<Review>,
}

/// In-memory product store.
///
/// Intended for tests and local development. Each product has its own async
/// mutex standing in for the row lock; writes are staged inside the
/// transaction and applied to the shared tables only on commit.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    tables: Arc<RwLock<Tables>>,
    row_locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_category(&self, category: &Category) -> Result<(), DatabaseError> {
        let mut tables = self.write_tables()?;
        tables.categories.insert(category.id);
        Ok(())
    }

    pub fn insert_product(&self, product: Product) -> Result<(), DatabaseError> {
        let mut tables = self.write_tables()?;
        if !tables.categories.contains(&product.category_id) {
            return Err(DatabaseError::MissingReference("products_category_id_fkey".to_string()));
        }
        if tables.products.contains_key(&product.id) {
            return Err(DatabaseError::UniqueViolation("products_pkey".to_string()));
        }
        tables.products.insert(product.id, product);
        Ok(())
    }

    /// Drop the reviewer reference on every review they wrote, as happens when
    /// an account is deleted.
    pub fn detach_reviewer(&self, reviewer_id: Uuid) -> Result<usize, DatabaseError> {
        let mut tables = self.write_tables()?;
        let mut detached = 0;
        for review in tables.reviews.iter_mut() {
            if review.reviewer_id == Some(reviewer_id) {
                review.reviewer_id = None;
                detached += 1;
            }
        }
        Ok(detached)
    }

    fn row_lock(&self, id: Uuid) -> Result<Arc<AsyncMutex<()>>, DatabaseError> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| lock_poisoned())?;
        Ok(locks.entry(id).or_default().clone())
    }

    fn forget_lock(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.row_locks.lock().map_err(|_| lock_poisoned())?.remove(&id);
        Ok(())
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.row_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    fn read_tables(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, DatabaseError> {
        self.tables.read().map_err(|_| lock_poisoned())
    }

    fn write_tables(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, DatabaseError> {
        self.tables.write().map_err(|_| lock_poisoned())
    }
}

fn lock_poisoned() -> DatabaseError {
    DatabaseError::Unavailable("memory store lock poisoned".to_string())
}

fn reviews_of(reviews: &[Review], product_id: Uuid) -> Vec<Review> {
    let mut matching: Vec<Review> = reviews
        .iter()
        .filter(|r| r.product_id == product_id)
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    matching
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        Ok(self.read_tables()?.products.get(&id).cloned())
    }

    async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, DatabaseError> {
        Ok(reviews_of(&self.read_tables()?.reviews, product_id))
    }

    async fn top_rated(&self, min_rating: Decimal, limit: usize) -> Result<Vec<Product>, DatabaseError> {
        let mut products: Vec<Product> = self
            .read_tables()?
            .products
            .values()
            .filter(|p| p.rating >= min_rating)
            .cloned()
            .collect();
        products.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        products.truncate(limit);
        Ok(products)
    }

    async fn create_product(&self, product: Product) -> Result<Product, DatabaseError> {
        self.insert_product(product.clone())?;
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError> {
        if !self.read_tables()?.products.contains_key(&id) {
            return Ok(false);
        }

        let lock = self.row_lock(id)?;
        let _guard = lock.lock().await;
        let removed = {
            let mut tables = self.write_tables()?;
            let removed = tables.products.remove(&id).is_some();
            // Reviews go with their product
            tables.reviews.retain(|r| r.product_id != id);
            removed
        };
        self.forget_lock(id)?;
        Ok(removed)
    }

    async fn lock_product(&self, id: Uuid) -> Result<Option<Box<dyn ProductTx>>, DatabaseError> {
        // Unknown ids never get a lock entry
        if !self.read_tables()?.products.contains_key(&id) {
            return Ok(None);
        }
        let guard = self.row_lock(id)?.lock_owned().await;

        // Snapshot only after the lock is held so no committed write is missed
        let snapshot = {
            let tables = self.read_tables()?;
            tables.products.get(&id).map(|product| {
                (
                    product.clone(),
                    reviews_of(&tables.reviews, id),
                    tables.categories.clone(),
                )
            })
        };

        match snapshot {
            Some((product, committed_reviews, categories)) => Ok(Some(Box::new(MemoryProductTx {
                _guard: guard,
                tables: Arc::clone(&self.tables),
                product,
                committed_reviews,
                staged_reviews: Vec::new(),
                categories,
            }))),
            // Deleted while we waited
            None => {
                drop(guard);
                self.forget_lock(id)?;
                Ok(None)
            }
        }
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.read_tables().map(|_| ())
    }
}

struct MemoryProductTx {
    _guard: OwnedMutexGuard<()>,
    tables: Arc<RwLock<Tables>>,
    product: Product,
    committed_reviews: Vec<Review>,
    staged_reviews: Vec<Review>,
    categories: HashSet<Uuid>,
}

impl MemoryProductTx {
    fn all_reviews(&self) -> impl Iterator<Item = &Review> {
        self.committed_reviews.iter().chain(self.staged_reviews.iter())
    }
}

#[async_trait]
impl ProductTx for MemoryProductTx {
    fn product(&self) -> &Product {
        &self.product
    }

    async fn reviews(&mut self) -> Result<Vec<Review>, DatabaseError> {
        Ok(self.all_reviews().cloned().collect())
    }

    async fn has_review_from(&mut self, reviewer_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.all_reviews().any(|r| r.reviewer_id == Some(reviewer_id)))
    }

    async fn insert_review(&mut self, review: NewReview) -> Result<Review, DatabaseError> {
        if review.product_id != self.product.id {
            return Err(DatabaseError::MissingReference("reviews_product_id_fkey".to_string()));
        }
        if self.all_reviews().any(|r| r.reviewer_id == Some(review.reviewer_id)) {
            return Err(DatabaseError::UniqueViolation("reviews_product_reviewer_key".to_string()));
        }
        let review = review.into_review(Utc::now());
        self.staged_reviews.push(review.clone());
        Ok(review)
    }

    async fn set_aggregate(&mut self, rating: Decimal, reviews_num: i32) -> Result<(), DatabaseError> {
        self.product.rating = rating;
        self.product.reviews_num = reviews_num;
        Ok(())
    }

    async fn set_price(&mut self, price: Decimal) -> Result<(), DatabaseError> {
        self.product.price = price;
        Ok(())
    }

    async fn set_details(&mut self, details: &ProductDetails) -> Result<(), DatabaseError> {
        if !self.categories.contains(&details.category_id) {
            return Err(DatabaseError::MissingReference("products_category_id_fkey".to_string()));
        }
        self.product.title = details.title.clone();
        self.product.vendor = details.vendor.clone();
        self.product.stock_quantity = details.stock_quantity;
        self.product.category_id = details.category_id;
        self.product.description = details.description.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<Product, DatabaseError> {
        let MemoryProductTx {
            _guard,
            tables,
            product,
            staged_reviews,
            ..
        } = *self;

        {
            let mut tables = tables.write().map_err(|_| lock_poisoned())?;
            tables.products.insert(product.id, product.clone());
            tables.reviews.extend(staged_reviews);
        }

        // The row lock is released only after the write is visible
        drop(_guard);
        Ok(product)
    }
}
