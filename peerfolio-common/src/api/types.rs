//! Shared API request/response types
//!
//! Boundary shapes accepted by the core operations. The HTTP layer
//! deserializes straight into these; validation happens in
//! [`crate::validation`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ========================================
// Review / Report Submissions
// ========================================

/// Review form as submitted by an author (create and edit)
///
/// # Examples
///
/// ```
/// use peerfolio_common::api::types::ReviewSubmission;
///
/// let json = r#"{
///     "linkedin_url": "https://linkedin.com/in/jane-doe",
///     "relationship": "colleague",
///     "rating": 4,
///     "content": "Great to work with on the billing rewrite."
/// }"#;
/// let submission: ReviewSubmission = serde_json::from_str(json).unwrap();
/// assert!(!submission.is_anonymous);
/// assert!(submission.tags.is_empty());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewSubmission {
    pub linkedin_url: String,

    #[serde(default)]
    pub person_name: Option<String>,

    #[serde(default)]
    pub person_title: Option<String>,

    /// One of mentor/interviewer/manager/colleague/employee/client/consultant/other
    pub relationship: String,

    pub rating: i64,

    pub content: String,

    #[serde(default)]
    pub is_anonymous: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Defaults to the submission time
    #[serde(default)]
    pub interaction_date: Option<DateTime<Utc>>,
}

/// Complaint against a review
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportSubmission {
    pub review_id: String,
    pub reason: String,
}

// ========================================
// Accounts
// ========================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub linkedin_url: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub accept_terms: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned once at login; the plaintext token is never stored
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub role: crate::db::Role,
    pub expires_at: DateTime<Utc>,
}

// ========================================
// Error Response Types
// ========================================

/// Error payload shared by every endpoint
///
/// ```json
/// {"error": {"code": "SELF_REVIEW", "message": "You cannot write a review about yourself."}}
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    /// Present for duplicate reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_review_id: Option<String>,
}
