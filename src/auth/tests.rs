//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT claim structure and round-trips
//! - Request validation limits
//! - Password hashing
//! - The full register/login/logout lifecycle against an in-memory database

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::{ApiError, ApiJson, AppState, Validator};
    use crate::services::{GeminiService, OAuthService};
    use axum::extract::{Extension, FromRequestParts};
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Fresh app state over an in-memory database with the full schema.
    /// One connection only, so every query sees the same database.
    async fn test_state() -> Arc<RwLock<AppState>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");

        crate::common::migrations::run_migrations(&pool)
            .await
            .expect("migrations");

        Arc::new(RwLock::new(AppState {
            db: pool,
            jwt_secret: "test_secret_key".to_string(),
            oauth_service: Arc::new(OAuthService::new(
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            )),
            gemini_service: Arc::new(GeminiService::new(None, "gemini-2.0-flash".to_string())),
        }))
    }

    async fn register_user(state: &Arc<RwLock<AppState>>, username: &str, email: &str) {
        handlers::register(
            Extension(state.clone()),
            ApiJson(models::RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: "secret".to_string(),
            }),
        )
        .await
        .expect("registration succeeds");
    }

    async fn login_token(state: &Arc<RwLock<AppState>>, email: &str, password: &str) -> String {
        let response = handlers::login(
            Extension(state.clone()),
            ApiJson(models::LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }),
        )
        .await
        .expect("login succeeds");

        response.0["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }

    /// Run the token guard the way a protected route would
    async fn authenticate(
        state: &Arc<RwLock<AppState>>,
        token: &str,
    ) -> Result<CurrentUser, ApiError> {
        let (mut parts, _) = Request::builder()
            .uri("/api/users/edit")
            .header("authorization", token)
            .body(())
            .expect("request")
            .into_parts();
        parts.extensions.insert(state.clone());

        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    async fn session_flag(state: &Arc<RwLock<AppState>>, email: &str) -> bool {
        let db = state.read().await.db.clone();
        let (active,): (bool,) =
            sqlx::query_as("SELECT jwt_auth_active FROM users WHERE email = ?")
                .bind(email)
                .fetch_one(&db)
                .await
                .expect("user row");
        active
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let state = test_state().await;
        register_user(&state, "jane", "jane@example.com").await;

        let second = handlers::register(
            Extension(state.clone()),
            ApiJson(models::RegisterRequest {
                username: "janet".to_string(),
                email: "jane@example.com".to_string(),
                password: "secret".to_string(),
            }),
        )
        .await;

        assert!(
            matches!(second, Err(ApiError::Conflict(ref msg)) if msg == "Email already taken")
        );

        // The original account is untouched
        let db = state.read().await.db.clone();
        let user: models::User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind("jane@example.com")
            .fetch_one(&db)
            .await
            .expect("user row");
        assert_eq!(user.username, "jane");
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_flag_unchanged() {
        let state = test_state().await;
        register_user(&state, "jane", "jane@example.com").await;
        assert!(!session_flag(&state, "jane@example.com").await);

        let wrong = handlers::login(
            Extension(state.clone()),
            ApiJson(models::LoginRequest {
                email: "jane@example.com".to_string(),
                password: "not-it".to_string(),
            }),
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized(ref msg)) if msg == "Wrong credentials."));
        assert!(!session_flag(&state, "jane@example.com").await);

        // A real login flips the flag; a later failed attempt leaves it set
        login_token(&state, "jane@example.com", "secret").await;
        assert!(session_flag(&state, "jane@example.com").await);

        let wrong_again = handlers::login(
            Extension(state.clone()),
            ApiJson(models::LoginRequest {
                email: "jane@example.com".to_string(),
                password: "not-it".to_string(),
            }),
        )
        .await;
        assert!(wrong_again.is_err());
        assert!(session_flag(&state, "jane@example.com").await);
    }

    #[tokio::test]
    async fn test_guard_rejects_token_for_inactive_session() {
        let state = test_state().await;
        register_user(&state, "jane", "jane@example.com").await;
        let token = login_token(&state, "jane@example.com", "secret").await;

        assert!(authenticate(&state, &token).await.is_ok());

        // Deactivate the session while the token itself still decodes
        let db = state.read().await.db.clone();
        sqlx::query("UPDATE users SET jwt_auth_active = 0 WHERE email = ?")
            .bind("jane@example.com")
            .execute(&db)
            .await
            .expect("flag update");

        let rejected = authenticate(&state, &token).await;
        assert!(
            matches!(rejected, Err(ApiError::BadRequest(ref msg)) if msg == "Token expired.")
        );
    }

    #[tokio::test]
    async fn test_logout_revokes_token_for_reuse() {
        let state = test_state().await;
        register_user(&state, "jane", "jane@example.com").await;
        let token = login_token(&state, "jane@example.com", "secret").await;

        let current = authenticate(&state, &token)
            .await
            .expect("active session authenticates");

        let response = handlers::logout(Extension(state.clone()), current)
            .await
            .expect("logout succeeds");
        assert_eq!(response.0["success"], true);

        // The revocation list wins over the session flag, so replaying the
        // token (a second logout included) fails as revoked
        let replayed = authenticate(&state, &token).await;
        assert!(
            matches!(replayed, Err(ApiError::BadRequest(ref msg)) if msg == "Token revoked.")
        );
    }

    #[tokio::test]
    async fn test_guard_rejects_token_for_unknown_user() {
        let state = test_state().await;
        let secret = state.read().await.jwt_secret.clone();
        let token = handlers::issue_session_token(&secret, "ghost@example.com")
            .expect("token issued");

        let rejected = authenticate(&state, &token).await;
        assert!(matches!(
            rejected,
            Err(ApiError::BadRequest(ref msg))
                if msg == "Sorry. Wrong auth token. This user does not exist."
        ));
    }

    #[test]
    fn test_session_token_round_trip() {
        let secret = "test_secret_key";
        let token = handlers::issue_session_token(secret, "jane@example.com")
            .expect("Failed to issue token");

        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.email, "jane@example.com");

        // Expiry lands about 30 minutes out
        let expected = (Utc::now() + Duration::minutes(30)).timestamp() as usize;
        assert!(decoded.claims.exp <= expected + 5);
        assert!(decoded.claims.exp >= expected - 5);
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let token = handlers::issue_session_token("test_secret_key", "jane@example.com")
            .expect("Failed to issue token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(b"wrong_secret_key"),
            &Validation::new(Algorithm::HS256),
        );

        assert!(
            result.is_err(),
            "Token validation should fail with wrong secret"
        );
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hashed = bcrypt::hash("secret123", 4).expect("Failed to hash");
        assert!(bcrypt::verify("secret123", &hashed).unwrap());
        assert!(!bcrypt::verify("wrong-password", &hashed).unwrap());
    }

    #[test]
    fn test_register_validation_limits() {
        let valid = models::RegisterRequest {
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(valid.validate(&valid).is_valid);

        let short_username = models::RegisterRequest {
            username: "j".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(!short_username.validate(&short_username).is_valid);

        let long_password = models::RegisterRequest {
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "x".repeat(17),
        };
        assert!(!long_password.validate(&long_password).is_valid);
    }

    #[test]
    fn test_login_validation_limits() {
        let short_email = models::LoginRequest {
            email: "a@b".to_string(),
            password: "secret".to_string(),
        };
        assert!(!short_email.validate(&short_email).is_valid);
    }

    #[test]
    fn test_user_public_view_hides_password() {
        let user = models::User {
            id: 7,
            username: "jane".to_string(),
            email: Some("jane@example.com".to_string()),
            password: Some("hashed".to_string()),
            jwt_auth_active: true,
            date_joined: Some("2024-01-01 00:00:00".to_string()),
        };

        let view = user.public_view();
        assert_eq!(view["_id"], 7);
        assert_eq!(view["username"], "jane");
        assert_eq!(view["email"], "jane@example.com");
        assert!(view.get("password").is_none());
    }
}
