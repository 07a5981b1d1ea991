//! Auth collaborator client
//!
//! Credentials and token storage live outside the session controller; this
//! client only speaks the wire protocol. Login is form-encoded (OAuth2
//! password flow on the server side), register and profile are JSON.

use super::error::{classify_status, classify_transport, ApiError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `POST /api/auth/register` request
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub grade_level: u8,
}

/// Bearer token issued on login/register
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// `GET /api/auth/me` response
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub grade_level: u8,
}

/// Client for the auth endpoints
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, ApiError> {
        let url = format!("{}/api/auth/register", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        Self::parse(response).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let url = format!("{}/api/auth/login", self.base_url);
        let form = [("username", username), ("password", password)];
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        Self::parse(response).await
    }

    pub async fn me(&self, token: &str) -> Result<UserProfile, ApiError> {
        let url = format!("{}/api/auth/me", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::unknown(format!("Failed to parse response: {e}")))
    }
}
