//! Public directory endpoints: lookup, profile, search and rankings

use axum::{
    extract::{Path, Query, State},
    Json,
};
use peerfolio_common::directory::{
    self, PersonLookup, PersonProfile, PersonSummary, DEFAULT_TOP_RATED_LIMIT,
};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Largest `limit` accepted by the top-rated listing
pub const MAX_TOP_RATED_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

/// GET /api/people/lookup?url=
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<PersonLookup>> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing url parameter".to_string()))?;
    Ok(Json(directory::get_person_by_linkedin_url(&state.db, &url).await?))
}

/// GET /api/people/:id
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PersonProfile>> {
    Ok(Json(directory::get_person_by_id(&state.db, &id).await?))
}

/// GET /api/people/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<PersonSummary>>> {
    Ok(Json(directory::search_people(&state.db, &query.q).await?))
}

/// GET /api/people/top?limit=
pub async fn top_rated(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<Vec<PersonSummary>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TOP_RATED_LIMIT)
        .clamp(1, MAX_TOP_RATED_LIMIT);
    Ok(Json(directory::top_rated_people(&state.db, limit).await?))
}
