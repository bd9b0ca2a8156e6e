//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::{ValidationResult, Validator};

/// JWT claims structure
///
/// Local login and OAuth login both issue this shape; the email claim is
/// what the token guard resolves back to a user row.
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub email: String,
    pub exp: usize,
}

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub jwt_auth_active: bool,
    pub date_joined: Option<String>,
}

impl User {
    /// Public view of a user, safe to return in API responses
    pub fn public_view(&self) -> serde_json::Value {
        serde_json::json!({
            "_id": self.id,
            "username": self.username,
            "email": self.email,
        })
    }
}

/// Registration request body
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validator<RegisterRequest> for RegisterRequest {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.username.len() < 2 || data.username.len() > 32 {
            result.add_error("username", "must be between 2 and 32 characters");
        }
        if data.email.len() < 4 || data.email.len() > 64 {
            result.add_error("email", "must be between 4 and 64 characters");
        }
        if data.password.len() < 4 || data.password.len() > 16 {
            result.add_error("password", "must be between 4 and 16 characters");
        }

        result
    }
}

/// Login request body
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validator<LoginRequest> for LoginRequest {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.email.len() < 4 || data.email.len() > 64 {
            result.add_error("email", "must be between 4 and 64 characters");
        }
        if data.password.len() < 4 || data.password.len() > 16 {
            result.add_error("password", "must be between 4 and 16 characters");
        }

        result
    }
}

/// Profile edit request body; both fields optional
#[derive(Deserialize, Debug)]
pub struct EditUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}
