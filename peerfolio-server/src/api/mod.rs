//! HTTP API handlers for peerfolio-server

pub mod admin;
pub mod auth;
pub mod error;
pub mod health;
pub mod people;
pub mod reviews;

pub use auth::{session_middleware, CurrentSession};
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
