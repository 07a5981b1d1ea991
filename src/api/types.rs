//! Wire types for the tutor API
//!
//! Request and response bodies are consumed as the server sends them; fields
//! this client never interprets (sample answers, per-question scores) are
//! still deserialized so payloads round-trip cleanly through logs.

use serde::{Deserialize, Serialize};

/// `POST /api/explain` request
#[derive(Debug, Clone, Serialize)]
pub struct ExplainRequest {
    pub query: String,
}

/// A cited source backing an explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source_type: String,
}

/// `POST /api/explain` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub svg_flashcard: Option<String>,
    pub session_id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// `POST /api/quiz/generate` request
#[derive(Debug, Clone, Serialize)]
pub struct QuizGenerateRequest {
    pub session_id: String,
    pub difficulty: String,
}

/// Question type as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
}

/// One quiz question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub sample_answer: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

/// `POST /api/quiz/generate` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizGenerateResponse {
    pub quiz_id: String,
    pub questions: Vec<Question>,
}

/// One normalized answer in a quiz submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_id: String,
    pub answer: String,
}

/// `POST /api/quiz/submit` request
#[derive(Debug, Clone, Serialize)]
pub struct QuizSubmitRequest {
    pub quiz_id: String,
    pub answers: Vec<QuizAnswer>,
}

/// Per-question grading feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizFeedback {
    pub question_id: String,
    pub correct: bool,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub sample_answer: Option<String>,
    #[serde(default)]
    pub explanation: String,
}

/// `POST /api/quiz/submit` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmitResponse {
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub mastery_achieved: bool,
    #[serde(default)]
    pub feedback: Vec<QuizFeedback>,
}
