//! PostgreSQL-backed product store.
//!
//! `lock_product` opens a transaction and takes `SELECT ... FOR UPDATE` on the
//! product row, so concurrent mutations of one product queue behind each other
//! while different products proceed independently. The transaction rolls back
//! when a `PgProductTx` is dropped without `commit`.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Category, NewReview, Product, ProductDetails, Review};
use crate::database::store::{ProductStore, ProductTx};

const PRODUCT_COLUMNS: &str = "id, title, picture, price, description, vendor, rating, \
     reviews_num, stock_quantity, created_at, category_id, owner_id";

const REVIEW_COLUMNS: &str = "id, title, rating, comment, created_at, product_id, reviewer_id";

#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_category(&self, category: &Category) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, DatabaseError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at, id"
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn top_rated(&self, min_rating: Decimal, limit: usize) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE rating >= $1 \
             ORDER BY rating DESC, created_at, id LIMIT $2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(min_rating)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn create_product(&self, product: Product) -> Result<Product, DatabaseError> {
        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.title)
            .bind(&product.picture)
            .bind(product.price)
            .bind(&product.description)
            .bind(&product.vendor)
            .bind(product.rating)
            .bind(product.reviews_num)
            .bind(product.stock_quantity)
            .bind(product.created_at)
            .bind(product.category_id)
            .bind(product.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(stored)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError> {
        // Waits on any FOR UPDATE holder; reviews follow via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn lock_product(&self, id: Uuid) -> Result<Option<Box<dyn ProductTx>>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        match product {
            Some(product) => {
                debug!("Locked product row {}", id);
                Ok(Some(Box::new(PgProductTx { tx, product })))
            }
            // Dropping the transaction releases the connection
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

struct PgProductTx {
    tx: Transaction<'static, Postgres>,
    product: Product,
}

impl PgProductTx {
    async fn apply_update(&mut self, sql: String, binds: UpdateBinds<'_>) -> Result<(), DatabaseError> {
        let mut query = sqlx::query_as::<_, Product>(&sql).bind(self.product.id);
        query = match binds {
            UpdateBinds::Aggregate { rating, reviews_num } => query.bind(rating).bind(reviews_num),
            UpdateBinds::Price(price) => query.bind(price),
            UpdateBinds::Details(details) => query
                .bind(&details.title)
                .bind(&details.vendor)
                .bind(details.stock_quantity)
                .bind(details.category_id)
                .bind(&details.description),
        };
        self.product = query
            .fetch_one(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }
}

enum UpdateBinds<'a> {
    Aggregate { rating: Decimal, reviews_num: i32 },
    Price(Decimal),
    Details(&'a ProductDetails),
}

#[async_trait]
impl ProductTx for PgProductTx {
    fn product(&self) -> &Product {
        &self.product
    }

    async fn reviews(&mut self) -> Result<Vec<Review>, DatabaseError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at, id"
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(self.product.id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(reviews)
    }

    async fn has_review_from(&mut self, reviewer_id: Uuid) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE product_id = $1 AND reviewer_id = $2)",
        )
        .bind(self.product.id)
        .bind(reviewer_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_review(&mut self, review: NewReview) -> Result<Review, DatabaseError> {
        let review = review.into_review(Utc::now());
        let sql = format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {REVIEW_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, Review>(&sql)
            .bind(review.id)
            .bind(&review.title)
            .bind(review.rating)
            .bind(&review.comment)
            .bind(review.created_at)
            .bind(review.product_id)
            .bind(review.reviewer_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(stored)
    }

    async fn set_aggregate(&mut self, rating: Decimal, reviews_num: i32) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE products SET rating = $2, reviews_num = $3 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        self.apply_update(sql, UpdateBinds::Aggregate { rating, reviews_num }).await
    }

    async fn set_price(&mut self, price: Decimal) -> Result<(), DatabaseError> {
        let sql = format!("UPDATE products SET price = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}");
        self.apply_update(sql, UpdateBinds::Price(price)).await
    }

    async fn set_details(&mut self, details: &ProductDetails) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE products SET title = $2, vendor = $3, stock_quantity = $4, category_id = $5, description = $6 \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        self.apply_update(sql, UpdateBinds::Details(details)).await
    }

    async fn commit(self: Box<Self>) -> Result<Product, DatabaseError> {
        let PgProductTx { tx, product } = *self;
        tx.commit().await?;
        debug!("Committed product transaction {}", product.id);
        Ok(product)
    }
}
