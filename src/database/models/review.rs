use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub title: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub product_id: Uuid,
    /// None once the reviewing account has been removed
    pub reviewer_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: Uuid,
    pub reviewer_id: Uuid,
    pub title: String,
    pub rating: i32,
    pub comment: String,
}

impl NewReview {
    pub fn into_review(self, created_at: DateTime<Utc>) -> Review {
        Review {
            id: Uuid::new_v4(),
            title: self.title,
            rating: self.rating,
            comment: self.comment,
            created_at,
            product_id: self.product_id,
            reviewer_id: Some(self.reviewer_id),
        }
    }
}
