//! Authentication routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/users/register` - Create a local account
/// - `POST /api/users/login` - Local login, issues a JWT
/// - `POST /api/users/edit` - Update profile (token required)
/// - `POST /api/users/logout` - Revoke the current token (token required)
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/users/register", post(handlers::register))
        .route("/api/users/login", post(handlers::login))
        .route("/api/users/edit", post(handlers::edit_user))
        .route("/api/users/logout", post(handlers::logout))
}
