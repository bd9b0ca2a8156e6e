//! Chat routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the chat router
///
/// # Routes
/// - `POST /api/chat` - Generate an ECharts config from a natural-language query
pub fn chat_routes() -> Router {
    Router::new().route("/api/chat", post(handlers::generate_chart_config))
}
