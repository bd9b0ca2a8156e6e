//! Authentication handlers

use axum::extract::Extension;
use axum::Json;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::CurrentUser;
use super::models::{Claims, EditUserRequest, LoginRequest, RegisterRequest, User};
use crate::common::{safe_email_log, ApiError, ApiJson, AppState, Validator};

/// POST /api/users/register
/// Creates a new local user account
///
/// # Request Body
/// ```json
/// {
///   "username": "jane",
///   "email": "jane@example.com",
///   "password": "secret"
/// }
/// ```
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let validation = payload.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();

    let existing: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if existing.is_some() {
        warn!(
            email = %safe_email_log(&payload.email),
            "Registration rejected: email already taken"
        );
        return Err(ApiError::Conflict("Email already taken".to_string()));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer("Failed to hash password".to_string())
    })?;

    let result = sqlx::query(
        "INSERT INTO users (username, email, password, jwt_auth_active) VALUES (?, ?, ?, 0)",
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let user_id = result.last_insert_rowid();

    info!(
        user_id = user_id,
        email = %safe_email_log(&payload.email),
        "New user account registered"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "userID": user_id,
        "msg": "The user was successfully registered",
    })))
}

/// POST /api/users/login
/// Authenticates a local user and issues a 30-minute session token
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let validation = payload.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let user = match user {
        Some(u) => u,
        None => {
            warn!(
                email = %safe_email_log(&payload.email),
                "Login failed: unknown email"
            );
            return Err(ApiError::Unauthorized(
                "This email does not exist.".to_string(),
            ));
        }
    };

    let password_matches = user
        .password
        .as_deref()
        .map(|hashed| verify(&payload.password, hashed).unwrap_or(false))
        .unwrap_or(false);

    if !password_matches {
        warn!(user_id = user.id, "Login failed: wrong credentials");
        return Err(ApiError::Unauthorized("Wrong credentials.".to_string()));
    }

    let token = issue_session_token(&state.jwt_secret, &payload.email)?;

    sqlx::query("UPDATE users SET jwt_auth_active = 1 WHERE id = ?")
        .bind(user.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = user.id,
        email = %safe_email_log(&payload.email),
        "User login successful"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "token": token,
        "user": user.public_view(),
    })))
}

/// POST /api/users/edit
/// Updates username and/or email for the authenticated user
pub async fn edit_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    current: CurrentUser,
    ApiJson(payload): ApiJson<EditUserRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if let Some(new_username) = &payload.username {
        sqlx::query("UPDATE users SET username = ? WHERE id = ?")
            .bind(new_username)
            .bind(current.user.id)
            .execute(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;
    }

    // Email uniqueness is not re-checked on update; a colliding value
    // surfaces as a database error from the UNIQUE constraint
    if let Some(new_email) = &payload.email {
        sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(new_email)
            .bind(current.user.id)
            .execute(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;
    }

    info!(user_id = current.user.id, "User profile updated");

    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/users/logout
/// Revokes the presented token and deactivates the session
pub async fn logout(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    current: CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    // Two separate writes; a crash in between leaves the token revoked
    // but the session flag still set
    sqlx::query("INSERT INTO jwt_token_blocklist (jwt_token, created_at) VALUES (?, ?)")
        .bind(&current.token)
        .bind(Utc::now().to_rfc3339())
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    sqlx::query("UPDATE users SET jwt_auth_active = 0 WHERE id = ?")
        .bind(current.user.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = current.user.id, "User logout successful");

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Encode a 30-minute HS256 session token carrying the user's email
pub fn issue_session_token(jwt_secret: &str, email: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::minutes(30)).timestamp() as usize;
    let claims = Claims {
        email: email.to_string(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}
