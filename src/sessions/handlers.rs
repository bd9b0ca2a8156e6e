//! OAuth session handlers
//!
//! Both providers follow the same shape: exchange the authorization code
//! for an access token, fetch the provider profile, upsert a local user,
//! and issue a session token identical to local login.

use axum::extract::Extension;
use axum::Json;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::auth::handlers::issue_session_token;
use crate::auth::models::User;
use crate::common::{safe_email_log, ApiError, ApiQuery, AppState};
use crate::services::oauth::OAuthError;

#[derive(Deserialize, Debug)]
pub struct OAuthCallbackParams {
    pub code: String,
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::MissingAccessToken => {
                ApiError::BadRequest("Failed to obtain access token from provider.".to_string())
            }
            other => ApiError::InternalServer(other.to_string()),
        }
    }
}

/// GET /api/sessions/oauth/github
/// Completes the GitHub OAuth flow for the given authorization code
pub async fn github_login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiQuery(params): ApiQuery<OAuthCallbackParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let access_token = state.oauth_service.github_exchange_code(&params.code).await?;
    let profile = state.oauth_service.github_user_profile(&access_token).await?;

    // GitHub identities are keyed by login name
    let existing: Option<User> =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(&profile.login)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    let user = match existing {
        Some(u) => u,
        None => {
            info!(username = %profile.login, provider = "github", "Creating new OAuth user");
            create_oauth_user(&state.db, &profile.login, profile.email.as_deref()).await?
        }
    };

    finish_oauth_login(&state, user).await
}

/// GET /api/sessions/oauth/google
/// Completes the Google OAuth flow for the given authorization code
pub async fn google_login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiQuery(params): ApiQuery<OAuthCallbackParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let access_token = match state.oauth_service.google_exchange_code(&params.code).await {
        Ok(t) => t,
        Err(OAuthError::MissingAccessToken) => {
            warn!("Google token exchange returned no access token");
            return Err(ApiError::BadRequest(
                "Failed to obtain access token from Google.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let profile = state.oauth_service.google_user_profile(&access_token).await?;

    // Google identities are keyed by email
    let existing: Option<User> = match profile.email.as_deref() {
        Some(email) => sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?,
        None => None,
    };

    let user = match existing {
        Some(u) => u,
        None => {
            let username = profile
                .name
                .clone()
                .or_else(|| profile.email.clone())
                .unwrap_or_else(|| "google-user".to_string());
            info!(username = %username, provider = "google", "Creating new OAuth user");
            create_oauth_user(&state.db, &username, profile.email.as_deref()).await?
        }
    };

    finish_oauth_login(&state, user).await
}

/// Insert a provider-sourced user; a duplicate email must not block
/// account creation, so the insert is retried without the email
async fn create_oauth_user(
    db: &SqlitePool,
    username: &str,
    email: Option<&str>,
) -> Result<User, ApiError> {
    let inserted = sqlx::query(
        "INSERT INTO users (username, email, jwt_auth_active) VALUES (?, ?, 0)",
    )
    .bind(username)
    .bind(email)
    .execute(db)
    .await;

    let result = match inserted {
        Ok(r) => r,
        Err(e) => {
            warn!(
                error = %e,
                username = %username,
                "OAuth user insert failed, retrying without email"
            );
            sqlx::query("INSERT INTO users (username, jwt_auth_active) VALUES (?, 0)")
                .bind(username)
                .execute(db)
                .await
                .map_err(ApiError::DatabaseError)?
        }
    };

    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(db)
        .await
        .map_err(ApiError::DatabaseError)
}

/// Issue a session token, activate the session flag, and build the
/// response body shared by both providers
async fn finish_oauth_login(
    state: &AppState,
    user: User,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Accounts without an email fall back to the username claim; the token
    // guard resolves users by email, so such tokens cannot reach protected
    // routes
    let claim_email = user
        .email
        .clone()
        .unwrap_or_else(|| user.username.clone());

    let token = issue_session_token(&state.jwt_secret, &claim_email)?;

    sqlx::query("UPDATE users SET jwt_auth_active = 1 WHERE id = ?")
        .bind(user.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = user.id,
        email = %safe_email_log(user.email.as_deref().unwrap_or("")),
        "OAuth login successful"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "user": {
            "_id": user.id,
            "email": user.email,
            "username": user.username,
            "token": token,
        },
    })))
}
