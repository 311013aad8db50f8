//! HTTP error mapping
//!
//! Every error body has the shape `{"error": {"code": "...", "message": "..."}}`.
//! Faults are logged here and reach the client only as the generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use peerfolio_common::api::auth::Session;
use peerfolio_common::api::types::{ErrorDetail, ErrorResponse};
use peerfolio_common::Error as CommonError;
use thiserror::Error as ThisError;
use tracing::error;

/// API error type
#[derive(Debug, ThisError)]
pub enum ApiError {
    /// Authenticated caller lacking the right role or ownership (403)
    #[error("{0}")]
    Forbidden(String),

    /// Malformed request the core never saw (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Core error, mapped by variant
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl ApiError {
    /// Map a core error for `session`; `Unauthorized` becomes 403 when the
    /// caller is logged in
    pub fn for_caller(err: CommonError, session: Option<&Session>) -> Self {
        match (err, session) {
            (CommonError::Unauthorized(message), Some(_)) => ApiError::Forbidden(message),
            (err, _) => ApiError::Common(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut existing_review_id = None;

        let (status, code, message) = match self {
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, "FORBIDDEN", message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
            ApiError::Common(err) => {
                let (status, code) = match &err {
                    CommonError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    CommonError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
                    CommonError::DuplicateReview { .. } => (StatusCode::CONFLICT, "DUPLICATE_REVIEW"),
                    CommonError::SelfReview => (StatusCode::BAD_REQUEST, "SELF_REVIEW"),
                    CommonError::ImmutableSubject => (StatusCode::BAD_REQUEST, "IMMUTABLE_SUBJECT"),
                    CommonError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    CommonError::StoreConflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };
                if !err.is_recoverable() {
                    error!("Request failed: {}", err);
                }
                if let CommonError::DuplicateReview {
                    existing_review_id: id,
                } = &err
                {
                    existing_review_id = Some(id.clone());
                }
                (status, code, err.user_message())
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                existing_review_id,
            },
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use peerfolio_common::db::Role;

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn test_unauthorized_without_session_is_401() {
        let response =
            ApiError::for_caller(CommonError::Unauthorized("Log in".to_string()), None).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unauthorized_with_session_is_403() {
        let response = ApiError::for_caller(
            CommonError::Unauthorized("Unauthorized access.".to_string()),
            Some(&session()),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_fault_maps_to_500() {
        let response = ApiError::from(CommonError::Internal("disk on fire".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_business_errors_keep_their_status() {
        let cases = [
            (CommonError::SelfReview, StatusCode::BAD_REQUEST),
            (CommonError::ImmutableSubject, StatusCode::BAD_REQUEST),
            (CommonError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (
                CommonError::DuplicateReview {
                    existing_review_id: "r1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
