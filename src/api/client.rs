//! Tutor API client
//!
//! The `TutorApi` trait is the seam the session controller talks through;
//! tests substitute a mock with queued responses.

use super::error::{classify_status, classify_transport, ApiError};
use super::types::{
    ExplainRequest, ExplainResponse, QuizAnswer, QuizGenerateRequest, QuizGenerateResponse,
    QuizSubmitRequest, QuizSubmitResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Client for the remote explanation/quiz API
#[async_trait]
pub trait TutorApi: Send + Sync {
    /// Request an explanation for a free-text query
    async fn explain(&self, query: &str) -> Result<ExplainResponse, ApiError>;

    /// Generate a quiz for an explanation session
    async fn generate_quiz(
        &self,
        session_id: &str,
        difficulty: &str,
    ) -> Result<QuizGenerateResponse, ApiError>;

    /// Submit normalized answers for grading
    async fn submit_quiz(
        &self,
        quiz_id: &str,
        answers: Vec<QuizAnswer>,
    ) -> Result<QuizSubmitResponse, ApiError>;
}

#[async_trait]
impl<T: TutorApi + ?Sized> TutorApi for Arc<T> {
    async fn explain(&self, query: &str) -> Result<ExplainResponse, ApiError> {
        (**self).explain(query).await
    }

    async fn generate_quiz(
        &self,
        session_id: &str,
        difficulty: &str,
    ) -> Result<QuizGenerateResponse, ApiError> {
        (**self).generate_quiz(session_id, difficulty).await
    }

    async fn submit_quiz(
        &self,
        quiz_id: &str,
        answers: Vec<QuizAnswer>,
    ) -> Result<QuizSubmitResponse, ApiError> {
        (**self).submit_quiz(quiz_id, answers).await
    }
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// reqwest-backed implementation against a configured base URL
pub struct HttpTutorApi {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpTutorApi {
    /// Build a client. Panics only if the TLS backend cannot initialize,
    /// which is unrecoverable at startup anyway.
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
        }
    }

    async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::unknown(format!("Failed to parse response: {e} - body: {text}")))
    }
}

#[async_trait]
impl TutorApi for HttpTutorApi {
    async fn explain(&self, query: &str) -> Result<ExplainResponse, ApiError> {
        let body = ExplainRequest {
            query: query.to_string(),
        };
        self.post_json("/api/explain", &body).await
    }

    async fn generate_quiz(
        &self,
        session_id: &str,
        difficulty: &str,
    ) -> Result<QuizGenerateResponse, ApiError> {
        let body = QuizGenerateRequest {
            session_id: session_id.to_string(),
            difficulty: difficulty.to_string(),
        };
        self.post_json("/api/quiz/generate", &body).await
    }

    async fn submit_quiz(
        &self,
        quiz_id: &str,
        answers: Vec<QuizAnswer>,
    ) -> Result<QuizSubmitResponse, ApiError> {
        let body = QuizSubmitRequest {
            quiz_id: quiz_id.to_string(),
            answers,
        };
        self.post_json("/api/quiz/submit", &body).await
    }
}
