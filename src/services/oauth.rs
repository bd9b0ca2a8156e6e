// src/services/oauth.rs
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("Provider did not return an access token")]
    MissingAccessToken,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Profile fields fetched from the GitHub user endpoint
#[derive(Debug, Deserialize)]
pub struct GitHubProfile {
    pub login: String,
    pub email: Option<String>,
}

/// Profile fields fetched from the Google userinfo endpoint
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: Option<String>,
}

/// OAuth code-exchange client for GitHub and Google
#[derive(Debug, Clone)]
pub struct OAuthService {
    client: Client,
    github_client_id: String,
    github_client_secret: String,
    google_client_id: String,
    google_client_secret: String,
    google_redirect_uri: String,
}

impl OAuthService {
    pub fn new(
        github_client_id: String,
        github_client_secret: String,
        google_client_id: String,
        google_client_secret: String,
        google_redirect_uri: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            github_client_id,
            github_client_secret,
            google_client_id,
            google_client_secret,
            google_redirect_uri,
        }
    }

    /// Exchange a GitHub authorization code for an access token
    ///
    /// GitHub answers with a form-encoded body (`access_token=..&scope=..`)
    /// unless asked for JSON, so the token is pulled out of the raw text.
    pub async fn github_exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let params = [
            ("client_id", self.github_client_id.as_str()),
            ("client_secret", self.github_client_secret.as_str()),
            ("code", code),
        ];

        debug!("Exchanging GitHub authorization code for access token");

        let response = self
            .client
            .post("https://github.com/login/oauth/access_token")
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "GitHub token exchange failed");
            return Err(OAuthError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        extract_access_token(&body).ok_or(OAuthError::MissingAccessToken)
    }

    /// Fetch the authenticated GitHub user's profile
    pub async fn github_user_profile(
        &self,
        access_token: &str,
    ) -> Result<GitHubProfile, OAuthError> {
        let response = self
            .client
            .get("https://api.github.com/user")
            .header("Authorization", format!("Bearer {}", access_token))
            // GitHub rejects requests without a User-Agent
            .header("User-Agent", "datahub-api")
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            error!(status = %status, "GitHub user endpoint returned error status");
            return Err(OAuthError::OAuthFailed(format!("HTTP {}", status)));
        }

        response
            .json::<GitHubProfile>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))
    }

    /// Exchange a Google authorization code for an access token
    ///
    /// Google answers with JSON; a success status without an `access_token`
    /// field still counts as a failed exchange.
    pub async fn google_exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let params = [
            ("code", code),
            ("client_id", self.google_client_id.as_str()),
            ("client_secret", self.google_client_secret.as_str()),
            ("redirect_uri", self.google_redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging Google authorization code for access token");

        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let token_response = response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))?;

        token_response
            .access_token
            .ok_or(OAuthError::MissingAccessToken)
    }

    /// Fetch the authenticated Google user's profile
    pub async fn google_user_profile(
        &self,
        access_token: &str,
    ) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .client
            .get("https://www.googleapis.com/oauth2/v2/userinfo")
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            error!(status = %status, "Google userinfo endpoint returned error status");
            return Err(OAuthError::OAuthFailed(format!("HTTP {}", status)));
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))
    }
}

/// Pull `access_token` out of a form-encoded response body
pub fn extract_access_token(body: &str) -> Option<String> {
    body.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "access_token" && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}
