//! Property-based tests for the session invariants
//!
//! These tests verify key invariants hold across all possible inputs.

use super::feedback;
use super::message::{Message, MessageLog, Role, RoutingMetadata};
use super::router::{route, Dispatch};
use crate::api::types::{Question, QuestionType};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::User), Just(Role::Assistant)]
}

fn arb_question() -> impl Strategy<Value = Question> {
    (
        "[a-z]{1,8}",
        "[A-Za-z ?]{1,40}",
        proptest::collection::vec("[A-Za-z ]{1,20}", 2..5),
    )
        .prop_map(|(id, question, options)| Question {
            id,
            question,
            question_type: QuestionType::MultipleChoice,
            options,
            correct_answer: None,
            sample_answer: None,
            explanation: String::new(),
        })
}

fn arb_routing() -> impl Strategy<Value = RoutingMetadata> {
    prop_oneof![
        Just(RoutingMetadata::None),
        ("[a-z0-9-]{1,12}", "[a-z ]{1,20}").prop_map(|(session_id, last_topic)| {
            RoutingMetadata::ExpectingYesNo {
                session_id,
                last_topic,
            }
        }),
        (
            proptest::collection::vec("[A-Za-z ]{1,20}", 1..6),
            "[a-z ]{1,20}"
        )
            .prop_map(|(topics, last_topic)| {
                RoutingMetadata::ExpectingTopicChoice { topics, last_topic }
            }),
        (
            "[a-z0-9-]{1,12}",
            proptest::collection::vec(arb_question(), 1..6)
        )
            .prop_map(|(quiz_id, questions)| {
                RoutingMetadata::ExpectingQuizAnswers {
                    quiz_id,
                    questions,
                    last_topic: None,
                }
            }),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_role(), "[A-Za-z ?!.]{0,60}", arb_routing()).prop_map(|(role, content, routing)| {
        let message = match role {
            Role::User => Message::user(content),
            Role::Assistant => Message::assistant(content),
        };
        message.with_routing(routing)
    })
}

// ============================================================================
// Message Log Invariants
// ============================================================================

proptest! {
    /// `last_assistant_message` always equals the most recently appended
    /// assistant turn, regardless of the append sequence
    #[test]
    fn last_assistant_tracks_appends(messages in proptest::collection::vec(arb_message(), 0..30)) {
        let mut log = MessageLog::new();
        let mut expected: Option<String> = None;

        for message in messages {
            if message.role == Role::Assistant {
                expected = Some(message.content.clone());
            }
            log.append(message);
        }

        let actual = log.last_assistant_message().map(|m| m.content.clone());
        prop_assert_eq!(actual, expected);
    }

    /// Appended ids strictly increase
    #[test]
    fn message_ids_strictly_increase(messages in proptest::collection::vec(arb_message(), 1..30)) {
        let mut log = MessageLog::new();
        let mut previous = 0u64;
        for message in messages {
            let id = log.append(message);
            prop_assert!(id > previous);
            previous = id;
        }
    }
}

// ============================================================================
// Router Invariants
// ============================================================================

proptest! {
    /// Routing is a pure function: the same inputs always produce the same
    /// dispatch
    #[test]
    fn routing_is_deterministic(routing in arb_routing(), input in "[A-Za-z0-9 ,?]{0,40}") {
        let first = route(Some(&routing), &input);
        let second = route(Some(&routing), &input);
        prop_assert_eq!(first, second);
    }

    /// Every metadata variant selects its own handler family
    #[test]
    fn routing_matches_the_metadata_variant(routing in arb_routing(), input in "[A-Za-z ]{1,20}") {
        let dispatch = route(Some(&routing), &input);
        match routing {
            RoutingMetadata::None => {
                prop_assert!(
                    matches!(dispatch, Dispatch::Explain { .. }),
                    "expected Dispatch::Explain"
                );
            }
            RoutingMetadata::ExpectingYesNo { .. } => {
                prop_assert!(
                    matches!(dispatch, Dispatch::QuizYesNo { .. }),
                    "expected Dispatch::QuizYesNo"
                );
            }
            RoutingMetadata::ExpectingTopicChoice { .. } => {
                prop_assert!(
                    matches!(dispatch, Dispatch::SelectTopic { .. }),
                    "expected Dispatch::SelectTopic"
                );
            }
            RoutingMetadata::ExpectingQuizAnswers { .. } => {
                prop_assert!(
                    matches!(dispatch, Dispatch::GradeQuiz { .. }),
                    "expected Dispatch::GradeQuiz"
                );
            }
        }
    }
}

// ============================================================================
// Answer Normalization Invariants
// ============================================================================

proptest! {
    /// Letter input is accepted iff the comma-separated count matches the
    /// question count; accepted input yields one answer per question, in order
    #[test]
    fn letter_count_governs_acceptance(
        questions in proptest::collection::vec(arb_question(), 1..6),
        letters in proptest::collection::vec("[a-dA-D]", 1..8),
    ) {
        let input = letters.join(", ");
        let result = feedback::letter_answers(&input, &questions);

        if letters.len() == questions.len() {
            let answers = result.unwrap();
            prop_assert_eq!(answers.len(), questions.len());
            for (answer, question) in answers.iter().zip(&questions) {
                prop_assert_eq!(&answer.question_id, &question.id);
            }
        } else {
            let err = result.unwrap_err();
            prop_assert_eq!(err.expected, questions.len());
            prop_assert_eq!(err.got, letters.len());
        }
    }

    /// A letter with a matching option always maps to that option's text
    #[test]
    fn in_range_letters_map_to_option_text(question in arb_question(), index in 0usize..4) {
        prop_assume!(index < question.options.len());
        #[allow(clippy::cast_possible_truncation)]
        let letter = char::from(b'A' + index as u8);
        let answers = feedback::letter_answers(&letter.to_string(), std::slice::from_ref(&question)).unwrap();
        prop_assert_eq!(&answers[0].answer, &question.options[index]);
    }
}
