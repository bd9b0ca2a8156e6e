// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{GeminiService, OAuthService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub oauth_service: Arc<OAuthService>,
    pub gemini_service: Arc<GeminiService>,
}
