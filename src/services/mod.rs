// src/services/mod.rs
//
// Shared services module containing outbound-HTTP clients
// that can be used across different domain modules

pub mod gemini;
pub mod oauth;

// Re-export commonly used types for convenience
pub use gemini::GeminiService;
pub use oauth::OAuthService;
