//! OAuth session routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the OAuth session router
///
/// # Routes
/// - `GET /api/sessions/oauth/github` - GitHub code exchange and login
/// - `GET /api/sessions/oauth/google` - Google code exchange and login
pub fn sessions_routes() -> Router {
    Router::new()
        .route("/api/sessions/oauth/github", get(handlers::github_login))
        .route("/api/sessions/oauth/google", get(handlers::google_login))
}
