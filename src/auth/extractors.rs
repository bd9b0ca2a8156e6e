//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::{Claims, User};
use crate::common::helpers::safe_token_log;
use crate::common::{safe_email_log, ApiError, AppState};

/// Current-user extractor guarding protected routes
///
/// Resolves the raw JWT from the `authorization` header (the token is sent
/// bare, with no `Bearer ` prefix) and runs the full session check: decode,
/// user lookup by email claim, revocation-list lookup, active-session flag.
/// Every failure is a 400 with the same body shape.
#[derive(Debug)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the Extension containing the AppState
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let token = match token {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing authorization header");
                return Err(ApiError::BadRequest("Valid JWT token is missing".into()));
            }
        };

        // Expired, malformed, and signature-invalid tokens all collapse
        // into the same generic failure
        let decoded = match decode::<Claims>(
            &token,
            &DecodingKey::from_secret(app_state.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, token = %safe_token_log(&token), "JWT token validation failed");
                return Err(ApiError::BadRequest("Token is invalid".into()));
            }
        };

        let email = decoded.claims.email;

        let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&app_state.db)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    email = %safe_email_log(&email),
                    "Database error during user lookup in authentication"
                );
                ApiError::DatabaseError(e)
            })?;

        let user = match user {
            Some(u) => u,
            None => {
                warn!(
                    email = %safe_email_log(&email),
                    "Authentication failed: no user for token email claim"
                );
                return Err(ApiError::BadRequest(
                    "Sorry. Wrong auth token. This user does not exist.".into(),
                ));
            }
        };

        // A revoked token stays invalid even before its embedded expiry
        let revoked: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM jwt_token_blocklist WHERE jwt_token = ?")
                .bind(&token)
                .fetch_optional(&app_state.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        if revoked.is_some() {
            warn!(
                user_id = user.id,
                token = %safe_token_log(&token),
                "Authentication failed: token is revoked"
            );
            return Err(ApiError::BadRequest("Token revoked.".into()));
        }

        if !user.jwt_auth_active {
            warn!(user_id = user.id, "Authentication failed: session not active");
            return Err(ApiError::BadRequest("Token expired.".into()));
        }

        debug!(
            user_id = user.id,
            email = %safe_email_log(&email),
            "User authentication successful via extractor"
        );

        Ok(CurrentUser { user, token })
    }
}
