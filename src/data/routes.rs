//! Indicator data routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the data query router
///
/// # Routes
/// - `POST /api/query-data` - Filtered records plus available filter values
/// - `GET /api/query-menu` - Aggregated navigation menu across all sectors
pub fn data_routes() -> Router {
    Router::new()
        .route("/api/query-data", post(handlers::query_data))
        .route("/api/query-menu", get(handlers::query_menu))
}
