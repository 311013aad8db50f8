//! Author endpoints: submit, edit and report reviews, plus "my reviews"

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use peerfolio_common::accounts;
use peerfolio_common::api::types::{ReportSubmission, ReviewSubmission};
use peerfolio_common::db::{Report, Review};
use peerfolio_common::directory::{self, AuthoredReview, PublicReview};
use peerfolio_common::moderation::{self, SubmittedReview};
use serde::Serialize;

use super::auth::CurrentSession;
use super::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/reviews
pub async fn submit(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    payload: Result<Json<ReviewSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmittedReview>)> {
    let Json(input) = payload?;
    let submitted = moderation::submit_review(
        &state.db,
        session.as_ref(),
        &input,
        state.config.moderation,
        Utc::now(),
    )
    .await
    .map_err(|e| ApiError::for_caller(e, session.as_ref()))?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// PUT /api/reviews/:id
pub async fn edit(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    payload: Result<Json<ReviewSubmission>, JsonRejection>,
) -> ApiResult<Json<Review>> {
    let Json(input) = payload?;
    let review = moderation::edit_review(
        &state.db,
        session.as_ref(),
        &id,
        &input,
        state.config.moderation,
        Utc::now(),
    )
    .await
    .map_err(|e| ApiError::for_caller(e, session.as_ref()))?;
    Ok(Json(review))
}

/// POST /api/reports
pub async fn report(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    payload: Result<Json<ReportSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let Json(input) = payload?;
    let report = moderation::report_review(&state.db, session.as_ref(), &input, Utc::now())
        .await
        .map_err(|e| ApiError::for_caller(e, session.as_ref()))?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/me/reviews
pub async fn my_reviews(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<Json<Vec<AuthoredReview>>> {
    let reviews = directory::reviews_by_author(&state.db, session.as_ref()).await?;
    Ok(Json(reviews))
}

/// GET /api/me/received
pub async fn received_reviews(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<Json<Vec<PublicReview>>> {
    let reviews = directory::reviews_about_me(&state.db, session.as_ref()).await?;
    Ok(Json(reviews))
}

#[derive(Debug, Serialize)]
pub struct LinkedInUrlResponse {
    pub linkedin_url: Option<String>,
}

/// GET /api/users/:id/linkedin
pub async fn user_linkedin(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<LinkedInUrlResponse>> {
    let linkedin_url = accounts::linkedin_url_for(&state.db, session.as_ref(), &user_id)
        .await
        .map_err(|e| ApiError::for_caller(e, session.as_ref()))?;
    Ok(Json(LinkedInUrlResponse { linkedin_url }))
}
