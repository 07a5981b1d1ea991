//! Turn router
//!
//! Pure function from (routing metadata of the last assistant turn, user
//! input) to a handler selection. First match wins; with no assistant turn
//! yet, input falls through to concept explanation.

use super::message::RoutingMetadata;
use crate::api::types::Question;

/// Handler selection with everything the handler needs to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Grade the outstanding quiz against the raw input
    GradeQuiz {
        quiz_id: String,
        questions: Vec<Question>,
        last_topic: Option<String>,
        input: String,
    },

    /// Interpret the input as a yes/no reply to the quiz offer
    QuizYesNo {
        /// Lower-cased input
        input: String,
        session_id: String,
        last_topic: String,
    },

    /// Resolve the input against a numbered topic list
    SelectTopic {
        input: String,
        topics: Vec<String>,
    },

    /// Treat the input as a new concept query
    Explain { query: String },
}

pub fn route(last_routing: Option<&RoutingMetadata>, input: &str) -> Dispatch {
    match last_routing {
        Some(RoutingMetadata::ExpectingQuizAnswers {
            quiz_id,
            questions,
            last_topic,
        }) => Dispatch::GradeQuiz {
            quiz_id: quiz_id.clone(),
            questions: questions.clone(),
            last_topic: last_topic.clone(),
            input: input.to_string(),
        },

        Some(RoutingMetadata::ExpectingYesNo {
            session_id,
            last_topic,
        }) => Dispatch::QuizYesNo {
            input: input.to_lowercase(),
            session_id: session_id.clone(),
            last_topic: last_topic.clone(),
        },

        Some(RoutingMetadata::ExpectingTopicChoice { topics, .. }) => Dispatch::SelectTopic {
            input: input.to_string(),
            topics: topics.clone(),
        },

        Some(RoutingMetadata::None) | None => Dispatch::Explain {
            query: input.to_string(),
        },
    }
}
