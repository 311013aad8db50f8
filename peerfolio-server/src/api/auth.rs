//! Session middleware and account endpoints
//!
//! The middleware turns `Authorization: Bearer <token>` into a
//! [`CurrentSession`] request extension. A missing, unknown or expired token
//! yields an anonymous caller; handlers decide whether that is enough.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::Utc;
use peerfolio_common::accounts;
use peerfolio_common::api::auth::{parse_bearer, resolve_session, Session};
use peerfolio_common::api::types::{LoginRequest, LoginResponse, Registration};
use peerfolio_common::db::User;
use tracing::debug;

use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Caller identity resolved by [`session_middleware`]
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn as_ref(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
}

/// Resolve the bearer token (if any) and attach the session to the request
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let session = match bearer_token(request.headers()) {
        Some(token) => {
            let session = resolve_session(&state.db, token, Utc::now()).await?;
            if session.is_none() {
                debug!("Request carried an unknown or expired token");
            }
            session
        }
        None => None,
    };

    request.extensions_mut().insert(CurrentSession(session));
    Ok(next.run(request).await)
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(input) = payload?;
    let user =
        accounts::register_user(&state.db, &input, state.config.bcrypt_cost, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(input) = payload?;
    let response = accounts::login(
        &state.db,
        &input.email,
        &input.password,
        state.config.session_ttl_seconds,
        Utc::now(),
    )
    .await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    match bearer_token(&headers) {
        Some(token) => {
            accounts::logout(&state.db, token).await?;
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::BadRequest("Missing bearer token".to_string())),
    }
}
