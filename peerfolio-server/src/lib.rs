//! peerfolio-server library - JSON API for the PeerFolio review service
//!
//! Handlers only translate HTTP to calls into `peerfolio_common`; business
//! rules live there.

use axum::Router;
use peerfolio_common::config::ServerConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved server settings
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: ServerConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// Every `/api` route runs behind the session middleware; `/health` does not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let api = Router::new()
        // Accounts
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/users/:id/linkedin", get(api::reviews::user_linkedin))
        // Directory
        .route("/api/people/lookup", get(api::people::lookup))
        .route("/api/people/search", get(api::people::search))
        .route("/api/people/top", get(api::people::top_rated))
        .route("/api/people/:id", get(api::people::get_person))
        // Authoring
        .route("/api/reviews", post(api::reviews::submit))
        .route("/api/reviews/:id", put(api::reviews::edit))
        .route("/api/reports", post(api::reviews::report))
        .route("/api/me/reviews", get(api::reviews::my_reviews))
        .route("/api/me/received", get(api::reviews::received_reviews))
        // Moderation
        .route("/api/admin/reviews/pending", get(api::admin::pending_reviews))
        .route("/api/admin/reviews/:id/approve", post(api::admin::approve))
        .route("/api/admin/reviews/:id/reject", post(api::admin::reject))
        .route("/api/admin/reports", get(api::admin::open_reports))
        .route("/api/admin/reports/:id/resolve", post(api::admin::resolve))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
