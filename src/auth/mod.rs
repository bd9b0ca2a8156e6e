//! # Auth Module
//!
//! This module handles all local-account functionality including:
//! - Registration and login with hashed passwords
//! - JWT token generation and validation
//! - Token revocation on logout
//! - CurrentUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use extractors::CurrentUser;
pub use models::User;
pub use routes::auth_routes;
