use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

pub const DUPLICATE_REVIEW_DETAIL: &str = "You have already reviewed this product";
pub const INVALID_RATING_DETAIL: &str = "Please select a rating";

/// Failures of the catalog operations (reviews, pricing, product edits)
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("{}", DUPLICATE_REVIEW_DETAIL)]
    DuplicateReview,

    #[error("{}", INVALID_RATING_DETAIL)]
    InvalidRating,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl CatalogError {
    pub fn product_not_found(id: Uuid) -> Self {
        CatalogError::NotFound(format!("Product {} not found", id))
    }
}
