//! Shared API functionality
//!
//! Session authentication and the boundary types accepted by the core
//! operations. No HTTP framework code lives here; `peerfolio-server` wraps
//! these with its axum middleware and handlers.

pub mod auth;
pub mod types;

pub use auth::{parse_bearer, resolve_session, Session};
pub use types::{
    ErrorDetail, ErrorResponse, LoginRequest, LoginResponse, Registration, ReportSubmission,
    ReviewSubmission,
};
