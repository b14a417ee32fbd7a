use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewReview, ProductView};
use crate::database::store::ProductStore;
use crate::services::error::CatalogError;
use crate::services::money::mean_rating;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Authenticated user writing a review
#[derive(Debug, Clone)]
pub struct Reviewer {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct ReviewSubmission {
    /// 1..=5; 0 means the reviewer did not pick a rating
    pub rating: i32,
    pub comment: String,
}

/// Records reviews and keeps each product's rating and review count equal to
/// the mean and count of its stored reviews.
#[derive(Clone)]
pub struct ReviewLedger {
    store: Arc<dyn ProductStore>,
}

impl ReviewLedger {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Add one review for `reviewer` and recompute the product aggregate.
    ///
    /// The duplicate check, the insert and the aggregate update all run under
    /// the product's lock inside one transaction; any error rolls back both
    /// writes.
    #[instrument(skip(self, reviewer, submission), fields(rating = submission.rating))]
    pub async fn submit_review(
        &self,
        product_id: Uuid,
        reviewer: Option<&Reviewer>,
        submission: ReviewSubmission,
    ) -> Result<ProductView, CatalogError> {
        let reviewer = reviewer.ok_or(CatalogError::Unauthenticated)?;

        let mut tx = self
            .store
            .lock_product(product_id)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(product_id))?;

        if tx.has_review_from(reviewer.id).await? {
            return Err(CatalogError::DuplicateReview);
        }
        if submission.rating == 0 {
            return Err(CatalogError::InvalidRating);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&submission.rating) {
            return Err(CatalogError::Validation(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        tx.insert_review(NewReview {
            product_id,
            reviewer_id: reviewer.id,
            title: reviewer.display_name.clone(),
            rating: submission.rating,
            comment: submission.comment,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::UniqueViolation(_) => CatalogError::DuplicateReview,
            other => CatalogError::Database(other),
        })?;

        // Recompute from every stored review rather than folding into the old mean
        let reviews = tx.reviews().await?;
        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
        let reviews_num = i32::try_from(ratings.len())
            .map_err(|_| CatalogError::Validation("too many reviews".to_string()))?;
        tx.set_aggregate(mean_rating(&ratings), reviews_num).await?;

        let product = tx.commit().await?;
        info!(
            "Review added to product {} by {} (rating now {} over {} reviews)",
            product.id, reviewer.id, product.rating, product.reviews_num
        );

        Ok(ProductView::new(product, reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryProductStore;
    use crate::database::models::{Category, Product, ProductDetails, Review};
    use crate::database::store::ProductTx;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn seeded() -> (Arc<MemoryProductStore>, Product) {
        let store = MemoryProductStore::new();
        let category = Category::new("Laptops");
        store.insert_category(&category).unwrap();
        let product = Product::new("Notebook", Decimal::new(50000, 2), category.id);
        store.insert_product(product.clone()).unwrap();
        (Arc::new(store), product)
    }

    fn reviewer(name: &str) -> Reviewer {
        Reviewer {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
        }
    }

    fn submission(rating: i32) -> ReviewSubmission {
        ReviewSubmission {
            rating,
            comment: "solid".to_string(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn first_review_sets_aggregate() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store.clone());
        let alice = reviewer("Alice");

        let view = ledger
            .submit_review(product.id, Some(&alice), submission(4))
            .await
            .unwrap();

        assert_eq!(view.product.reviews_num, 1);
        assert_eq!(view.product.rating, dec("4.00"));
        assert_eq!(view.reviews.len(), 1);
        assert_eq!(view.reviews[0].title, "Alice");
        assert_eq!(view.reviews[0].reviewer_id, Some(alice.id));
        assert_eq!(view.reviews[0].comment, "solid");
    }

    #[tokio::test]
    async fn rating_tracks_mean_of_all_reviews() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store.clone());

        for (i, rating) in [5, 4, 4, 1, 3].into_iter().enumerate() {
            let who = reviewer(&format!("user{}", i));
            ledger
                .submit_review(product.id, Some(&who), submission(rating))
                .await
                .unwrap();
        }

        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.reviews_num, 5);
        // 17 / 5
        assert_eq!(stored.rating, dec("3.40"));
        assert_eq!(store.list_reviews(product.id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn second_review_from_same_user_is_rejected() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store.clone());
        let bob = reviewer("Bob");

        ledger
            .submit_review(product.id, Some(&bob), submission(2))
            .await
            .unwrap();
        let err = ledger
            .submit_review(product.id, Some(&bob), submission(5))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateReview));
        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.reviews_num, 1);
        assert_eq!(stored.rating, dec("2.00"));
    }

    #[tokio::test]
    async fn duplicate_wins_over_zero_rating() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store.clone());
        let bob = reviewer("Bob");

        ledger
            .submit_review(product.id, Some(&bob), submission(3))
            .await
            .unwrap();
        let err = ledger
            .submit_review(product.id, Some(&bob), submission(0))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateReview));
    }

    #[tokio::test]
    async fn zero_rating_creates_nothing() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store.clone());

        let err = ledger
            .submit_review(product.id, Some(&reviewer("Carol")), submission(0))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::InvalidRating));
        assert!(store.list_reviews(product.id).await.unwrap().is_empty());
        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.reviews_num, 0);
        assert_eq!(stored.rating, Decimal::ZERO);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store.clone());

        let err = ledger
            .submit_review(product.id, Some(&reviewer("Dan")), submission(6))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(store.list_reviews(product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_reviewer_is_rejected() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store);

        let err = ledger
            .submit_review(product.id, None, submission(5))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Unauthenticated));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (store, _) = seeded();
        let ledger = ReviewLedger::new(store);

        let err = ledger
            .submit_review(Uuid::new_v4(), Some(&reviewer("Eve")), submission(5))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reviews_are_all_counted() {
        let (store, product) = seeded();
        let ledger = ReviewLedger::new(store.clone());
        let barrier = Arc::new(tokio::sync::Barrier::new(8));
        let product_id = product.id;

        let mut handles = Vec::new();
        for i in 0..8 {
            let ledger = ledger.clone();
            let barrier = Arc::clone(&barrier);
            let who = reviewer(&format!("racer{}", i));
            let rating = (i % 5) + 1;
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                ledger
                    .submit_review(product_id, Some(&who), submission(rating))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.reviews_num, 8);
        // ratings 1,2,3,4,5,1,2,3 -> 21 / 8
        assert_eq!(stored.rating, dec("2.63"));
    }

    /// Store whose transactions never report an existing review, so the
    /// unique index is the only thing left to stop a second review.
    struct BlindStore(Arc<MemoryProductStore>);

    struct BlindTx(Box<dyn ProductTx>);

    #[async_trait]
    impl ProductStore for BlindStore {
        async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
            self.0.find_product(id).await
        }

        async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, DatabaseError> {
            self.0.list_reviews(product_id).await
        }

        async fn top_rated(&self, min_rating: Decimal, limit: usize) -> Result<Vec<Product>, DatabaseError> {
            self.0.top_rated(min_rating, limit).await
        }

        async fn create_product(&self, product: Product) -> Result<Product, DatabaseError> {
            self.0.create_product(product).await
        }

        async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError> {
            self.0.delete_product(id).await
        }

        async fn lock_product(&self, id: Uuid) -> Result<Option<Box<dyn ProductTx>>, DatabaseError> {
            let tx = self.0.lock_product(id).await?;
            Ok(tx.map(|tx| Box::new(BlindTx(tx)) as Box<dyn ProductTx>))
        }

        async fn health_check(&self) -> Result<(), DatabaseError> {
            self.0.health_check().await
        }
    }

    #[async_trait]
    impl ProductTx for BlindTx {
        fn product(&self) -> &Product {
            self.0.product()
        }

        async fn reviews(&mut self) -> Result<Vec<Review>, DatabaseError> {
            self.0.reviews().await
        }

        async fn has_review_from(&mut self, _reviewer_id: Uuid) -> Result<bool, DatabaseError> {
            Ok(false)
        }

        async fn insert_review(&mut self, review: NewReview) -> Result<Review, DatabaseError> {
            self.0.insert_review(review).await
        }

        async fn set_aggregate(&mut self, rating: Decimal, reviews_num: i32) -> Result<(), DatabaseError> {
            self.0.set_aggregate(rating, reviews_num).await
        }

        async fn set_price(&mut self, price: Decimal) -> Result<(), DatabaseError> {
            self.0.set_price(price).await
        }

        async fn set_details(&mut self, details: &ProductDetails) -> Result<(), DatabaseError> {
            self.0.set_details(details).await
        }

        async fn commit(self: Box<Self>) -> Result<Product, DatabaseError> {
            self.0.commit().await
        }
    }

    #[tokio::test]
    async fn unique_index_violation_reports_duplicate() {
        let (store, product) = seeded();
        let bob = reviewer("Bob");
        ReviewLedger::new(store.clone())
            .submit_review(product.id, Some(&bob), submission(5))
            .await
            .unwrap();

        let blind = ReviewLedger::new(Arc::new(BlindStore(store.clone())));
        let err = blind
            .submit_review(product.id, Some(&bob), submission(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateReview));

        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.reviews_num, 1);
        assert_eq!(stored.rating, dec("5.00"));
        assert_eq!(store.list_reviews(product.id).await.unwrap().len(), 1);
    }
}
