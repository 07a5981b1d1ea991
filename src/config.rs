//! Environment configuration

/// Configuration for the tutor API connection
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    /// Base URL of the tutor API (e.g. `http://localhost:8000`)
    pub base_url: String,
    /// Bearer token attached to every request, if the deployment needs one
    pub bearer_token: Option<String>,
    /// Login credentials used to obtain a token when none is configured
    pub credentials: Option<Credentials>,
}

/// Account credentials for the auth endpoints
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Needed only when the account must be registered first
    pub email: Option<String>,
    pub grade_level: u8,
}

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_GRADE_LEVEL: u8 = 8;

impl ApiConfig {
    pub fn from_env() -> Self {
        let credentials = match (
            std::env::var("TUTOR_USERNAME").ok(),
            std::env::var("TUTOR_PASSWORD").ok(),
        ) {
            (Some(username), Some(password)) => Some(Credentials {
                username,
                password,
                email: std::env::var("TUTOR_EMAIL").ok(),
                grade_level: std::env::var("TUTOR_GRADE_LEVEL")
                    .ok()
                    .and_then(|level| level.parse().ok())
                    .unwrap_or(DEFAULT_GRADE_LEVEL),
            }),
            _ => None,
        };

        Self {
            base_url: std::env::var("TUTOR_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            bearer_token: std::env::var("TUTOR_API_TOKEN").ok(),
            credentials,
        }
    }
}
