// handlers/protected/reviews.rs - POST /api/products/:id/reviews handler

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::ProductView;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::review_ledger::MAX_RATING;
use crate::services::{ReviewLedger, ReviewSubmission};

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// 0 (or absent) means no rating was picked
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

impl ReviewRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !(0..=MAX_RATING).contains(&self.rating) {
            return Err(ApiError::field_error(
                "rating",
                format!("rating must be between 0 and {}", MAX_RATING),
            ));
        }
        Ok(())
    }
}

pub async fn review_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: Option<Extension<AuthUser>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<ProductView> {
    let Json(request) = payload?;
    request.validate()?;

    let reviewer = user.map(|Extension(user)| user.reviewer());
    let view = ReviewLedger::new(state.store.clone())
        .submit_review(
            id,
            reviewer.as_ref(),
            ReviewSubmission {
                rating: request.rating,
                comment: request.comment,
            },
        )
        .await?;

    Ok(ApiResponse::success(view))
}
