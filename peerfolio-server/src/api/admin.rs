//! Admin moderation endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use peerfolio_common::db::Review;
use peerfolio_common::moderation::{
    self, OpenReport, PendingReview, RejectedReview, ResolvedReport,
};
use peerfolio_common::ReportDisposition;
use serde::Deserialize;

use super::auth::CurrentSession;
use super::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page, PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub remove_review: bool,
}

/// GET /api/admin/reviews/pending?page=
pub async fn pending_reviews(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<PendingReview>>> {
    let caller = session.as_ref();
    let scoped = |e| ApiError::for_caller(e, caller);

    let total = moderation::count_pending_reviews(&state.db, caller)
        .await
        .map_err(scoped)?;
    let pagination = calculate_pagination(total, query.page);
    let listing = moderation::list_pending_reviews(&state.db, caller, PAGE_SIZE, pagination.offset)
        .await
        .map_err(scoped)?;

    Ok(Json(Page::new(listing.items, listing.total, pagination)))
}

/// GET /api/admin/reports?page=
pub async fn open_reports(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<OpenReport>>> {
    let caller = session.as_ref();
    let scoped = |e| ApiError::for_caller(e, caller);

    let total = moderation::count_open_reports(&state.db, caller)
        .await
        .map_err(scoped)?;
    let pagination = calculate_pagination(total, query.page);
    let listing = moderation::list_open_reports(&state.db, caller, PAGE_SIZE, pagination.offset)
        .await
        .map_err(scoped)?;

    Ok(Json(Page::new(listing.items, listing.total, pagination)))
}

/// POST /api/admin/reviews/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> ApiResult<Json<Review>> {
    let review = moderation::approve_review(&state.db, session.as_ref(), &id, Utc::now())
        .await
        .map_err(|e| ApiError::for_caller(e, session.as_ref()))?;
    Ok(Json(review))
}

/// POST /api/admin/reviews/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> ApiResult<Json<RejectedReview>> {
    let rejected = moderation::reject_review(&state.db, session.as_ref(), &id, Utc::now())
        .await
        .map_err(|e| ApiError::for_caller(e, session.as_ref()))?;
    Ok(Json(rejected))
}

/// POST /api/admin/reports/:id/resolve
pub async fn resolve(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<Json<ResolvedReport>> {
    let Json(request) = payload?;
    let disposition = if request.remove_review {
        ReportDisposition::RemoveReview
    } else {
        ReportDisposition::Ignore
    };

    let resolved = moderation::resolve_report(
        &state.db,
        session.as_ref(),
        &id,
        disposition,
        Utc::now(),
    )
    .await
    .map_err(|e| ApiError::for_caller(e, session.as_ref()))?;
    Ok(Json(resolved))
}
