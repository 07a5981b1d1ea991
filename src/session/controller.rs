//! Conversation session controller
//!
//! Owns the message log and progress tracker, routes each user turn to a
//! handler, and paces the handlers' progress phases. Exactly one handler runs
//! at a time; the caller must not feed input while a handler is in flight.

use super::feedback;
use super::message::{Attachments, Message, MessageLog, QuizPayload, RoutingMetadata};
use super::progress::{PhaseKind, PhaseSpec, PhaseStatus, ProgressPhase, ProgressTracker};
use super::router::{route, Dispatch};
use super::topics;
use crate::api::types::{Question, QuizAnswer};
use crate::api::{ApiError, ApiErrorKind, TutorApi};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Difficulty sent with every quiz-generation request
const QUIZ_DIFFICULTY: &str = "medium";

/// Pacing seam. The production pacer sleeps; tests substitute an instant one.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Controller output, broadcast to whoever renders the session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    MessageAppended(Message),
    PhaseBegan(ProgressPhase),
    PhaseUpdated(ProgressPhase),
    RunCollapsed,
}

const EXPLAIN_PRELUDE: [PhaseSpec; 2] = [
    PhaseSpec {
        kind: PhaseKind::Processing,
        label: "Processing your question...",
        detail: "Analyzing what you're asking",
        delay: Duration::from_millis(500),
    },
    PhaseSpec {
        kind: PhaseKind::Keywords,
        label: "Identifying key concepts...",
        detail: "Extracting the important terms",
        delay: Duration::from_millis(800),
    },
];

const EXPLAIN_POSTLUDE: [PhaseSpec; 3] = [
    PhaseSpec {
        kind: PhaseKind::Explanation,
        label: "Generating explanation...",
        detail: "Composing a clear answer",
        delay: Duration::from_millis(1200),
    },
    PhaseSpec {
        kind: PhaseKind::Visual,
        label: "Creating visual flashcard...",
        detail: "Rendering a study visual",
        delay: Duration::from_millis(1000),
    },
    PhaseSpec {
        kind: PhaseKind::Finalizing,
        label: "Finalizing response...",
        detail: "Putting it all together",
        delay: Duration::from_millis(500),
    },
];

const GRADING_PRELUDE: [PhaseSpec; 2] = [
    PhaseSpec {
        kind: PhaseKind::Grading,
        label: "Evaluating your answers...",
        detail: "Checking each response",
        delay: Duration::from_millis(600),
    },
    PhaseSpec {
        kind: PhaseKind::Grading,
        label: "Calculating your score...",
        detail: "Tallying results",
        delay: Duration::from_millis(500),
    },
];

pub struct SessionController {
    log: MessageLog,
    progress: ProgressTracker,
    api: Arc<dyn TutorApi>,
    pacer: Arc<dyn Pacer>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(api: Arc<dyn TutorApi>, pacer: Arc<dyn Pacer>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            log: MessageLog::new(),
            progress: ProgressTracker::new(),
            api,
            pacer,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn messages(&self) -> &[Message] {
        self.log.all()
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Route one user turn to its handler and run it to completion
    pub async fn handle_input(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            return;
        }

        let dispatch = route(self.log.last_assistant_message().map(|m| &m.routing), input);
        self.append(Message::user(input));

        match dispatch {
            Dispatch::Explain { query } => self.handle_explain(&query).await,
            Dispatch::QuizYesNo {
                input,
                session_id,
                last_topic,
            } => {
                self.handle_quiz_offer_reply(&input, &session_id, &last_topic)
                    .await;
            }
            Dispatch::GradeQuiz {
                quiz_id,
                questions,
                last_topic,
                input,
            } => {
                self.handle_letter_answers(&quiz_id, &questions, last_topic, &input)
                    .await;
            }
            Dispatch::SelectTopic { input, topics } => {
                self.handle_topic_selection(&input, &topics).await;
            }
        }
    }

    /// Submit quiz answers picked interactively rather than typed as letters.
    /// No-op unless the last assistant turn is awaiting quiz answers.
    pub async fn submit_quiz_selections(&mut self, selections: &HashMap<String, String>) {
        let Some(RoutingMetadata::ExpectingQuizAnswers {
            quiz_id,
            questions,
            last_topic,
        }) = self.log.last_assistant_message().map(|m| m.routing.clone())
        else {
            return;
        };

        let answers = feedback::selection_answers(selections, &questions);
        self.grade(&quiz_id, answers, last_topic).await;
    }

    async fn handle_explain(&mut self, query: &str) {
        info!(query, "handling concept explanation");
        self.progress.begin_run();
        self.run_phases(&EXPLAIN_PRELUDE).await;

        let sources_id = self.begin_phase(
            PhaseKind::Sources,
            "Searching for credible sources...",
            "Querying the knowledge base",
        );
        self.pacer.pause(Duration::from_millis(1000)).await;

        let result = self.api.explain(query).await;
        match result {
            Ok(response) => {
                self.complete_phase(sources_id, None);

                let mut source_types: Vec<&str> = Vec::new();
                for source in &response.sources {
                    if !source_types.contains(&source.source_type.as_str()) {
                        source_types.push(source.source_type.as_str());
                    }
                }
                self.push_completed_phase(
                    PhaseKind::Sources,
                    format!("Found {} credible sources", response.sources.len()),
                    source_types.join(", "),
                );
                self.pacer.pause(Duration::from_millis(500)).await;

                self.run_phases(&EXPLAIN_POSTLUDE).await;
                self.collapse();

                let attachments = Attachments {
                    // servers send "" when no flashcard was generated
                    svg_flashcard: response.svg_flashcard.filter(|svg| !svg.is_empty()),
                    sources: response.sources,
                    keywords: response.keywords,
                    quiz: None,
                };
                self.append(Message::assistant(response.explanation).with_attachments(attachments));

                self.pacer.pause(Duration::from_millis(800)).await;
                self.append(
                    Message::assistant(
                        "Would you like to test your knowledge with a quick quiz? (yes/no)",
                    )
                    .with_routing(RoutingMetadata::ExpectingYesNo {
                        session_id: response.session_id,
                        last_topic: query.to_string(),
                    }),
                );
            }
            Err(err) => {
                warn!(error = %err, "explain request failed");
                self.fail_active_phase("Source search failed");
                self.collapse();
                self.append(Message::assistant_error(explain_error_message(&err)));
            }
        }
    }

    async fn handle_quiz_offer_reply(&mut self, input: &str, session_id: &str, last_topic: &str) {
        let affirmative = input.contains("yes") || input.trim() == "y";
        if !affirmative {
            info!("quiz declined, suggesting related topics");
            self.handle_related_topics(last_topic).await;
            return;
        }

        info!(session_id, "generating quiz");
        self.progress.begin_run();

        let create_id = self.begin_phase(
            PhaseKind::Quiz,
            "Creating your quiz...",
            "Reviewing what you just learned",
        );
        self.pacer.pause(Duration::from_millis(800)).await;
        self.complete_phase(create_id, None);

        let difficulty_id = self.begin_phase(
            PhaseKind::Quiz,
            "Calibrating difficulty...",
            "Selecting medium difficulty questions",
        );
        self.pacer.pause(Duration::from_millis(600)).await;

        let result = self.api.generate_quiz(session_id, QUIZ_DIFFICULTY).await;
        match result {
            Ok(quiz) => {
                self.complete_phase(difficulty_id, None);
                self.push_completed_phase(
                    PhaseKind::Quiz,
                    format!("Generated {} questions", quiz.questions.len()),
                    String::new(),
                );
                self.pacer.pause(Duration::from_millis(500)).await;
                self.collapse();

                let content = quiz_prompt(&quiz.questions);
                self.append(
                    Message::assistant(content)
                        .with_attachments(Attachments {
                            quiz: Some(QuizPayload {
                                quiz_id: quiz.quiz_id.clone(),
                                questions: quiz.questions.clone(),
                            }),
                            ..Attachments::default()
                        })
                        .with_routing(RoutingMetadata::ExpectingQuizAnswers {
                            quiz_id: quiz.quiz_id,
                            questions: quiz.questions,
                            last_topic: Some(last_topic.to_string()),
                        }),
                );
            }
            Err(err) => {
                warn!(error = %err, "quiz generation failed");
                self.fail_active_phase("Quiz generation failed");
                self.collapse();
                self.append(Message::assistant_error(
                    "I couldn't put a quiz together right now. Let's keep exploring instead.",
                ));
                self.handle_related_topics(last_topic).await;
            }
        }
    }

    async fn handle_letter_answers(
        &mut self,
        quiz_id: &str,
        questions: &[Question],
        last_topic: Option<String>,
        input: &str,
    ) {
        match feedback::letter_answers(input, questions) {
            Ok(answers) => self.grade(quiz_id, answers, last_topic).await,
            Err(mismatch) => {
                // No phases and no API call; the user can retry immediately.
                self.append(
                    Message::assistant_error(format!(
                        "Please provide exactly {} answers separated by commas (you gave {}). \
                         For example: A, C, B",
                        mismatch.expected, mismatch.got
                    ))
                    .with_routing(RoutingMetadata::ExpectingQuizAnswers {
                        quiz_id: quiz_id.to_string(),
                        questions: questions.to_vec(),
                        last_topic,
                    }),
                );
            }
        }
    }

    async fn grade(&mut self, quiz_id: &str, answers: Vec<QuizAnswer>, last_topic: Option<String>) {
        info!(quiz_id, answers = answers.len(), "grading quiz");
        self.progress.begin_run();
        self.run_phases(&GRADING_PRELUDE).await;

        let feedback_id = self.begin_phase(
            PhaseKind::Grading,
            "Preparing feedback...",
            "Reviewing each answer",
        );

        let result = self.api.submit_quiz(quiz_id, answers).await;
        match result {
            Ok(graded) => {
                self.complete_phase(
                    feedback_id,
                    Some(format!("Quiz completed! Score: {:.0}%", graded.score)),
                );
                self.pacer.pause(Duration::from_millis(800)).await;
                self.collapse();

                self.append(Message::assistant(feedback::build_result_report(&graded)));

                if let Some(topic) = last_topic {
                    self.handle_related_topics(&topic).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "quiz submission failed");
                self.fail_active_phase("Grading failed");
                self.collapse();
                self.append(Message::assistant_error(
                    "I couldn't grade your quiz right now. Please try submitting your answers again.",
                ));
            }
        }
    }

    async fn handle_related_topics(&mut self, last_topic: &str) {
        if last_topic.trim().is_empty() {
            return;
        }

        self.progress.begin_run();
        let search_id = self.begin_phase(
            PhaseKind::Topics,
            "Searching for related topics...",
            "Scanning the concept map",
        );
        self.pacer.pause(Duration::from_millis(800)).await;
        self.complete_phase(search_id, None);

        let topics = topics::related_topics(last_topic);
        self.push_completed_phase(
            PhaseKind::Topics,
            format!("Found {} contextually relevant topics", topics.len()),
            String::new(),
        );
        self.pacer.pause(Duration::from_millis(500)).await;
        self.collapse();

        let mut content = String::from("**🔍 Related topics to explore:**\n\n");
        for (index, topic) in topics.iter().enumerate() {
            let _ = writeln!(content, "{}. {topic}", index + 1);
        }
        content.push_str("\nReply with a number or a topic name to keep going!");

        self.append(
            Message::assistant(content).with_routing(RoutingMetadata::ExpectingTopicChoice {
                topics,
                last_topic: last_topic.to_string(),
            }),
        );
    }

    async fn handle_topic_selection(&mut self, input: &str, topics: &[String]) {
        let query = resolve_topic_choice(input, topics);
        self.handle_explain(&query).await;
    }

    /// Pace through an ordered phase list, completing each before the next
    async fn run_phases(&mut self, specs: &[PhaseSpec]) {
        for spec in specs {
            let id = self.begin_phase(spec.kind, spec.label, spec.detail);
            self.pacer.pause(spec.delay).await;
            self.complete_phase(id, None);
        }
    }

    fn begin_phase(
        &mut self,
        kind: PhaseKind,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> u64 {
        let id = self.progress.begin_phase(kind, label, detail);
        if let Some(phase) = self.progress.phase(id) {
            let _ = self.events.send(SessionEvent::PhaseBegan(phase.clone()));
        }
        id
    }

    fn complete_phase(&mut self, phase_id: u64, final_label: Option<String>) {
        self.progress.complete_phase(phase_id, final_label);
        if let Some(phase) = self.progress.phase(phase_id) {
            let _ = self.events.send(SessionEvent::PhaseUpdated(phase.clone()));
        }
    }

    /// Append an already-completed summary phase
    fn push_completed_phase(&mut self, kind: PhaseKind, label: String, detail: String) {
        let id = self.progress.begin_phase(kind, label, detail);
        self.progress.complete_phase(id, None);
        if let Some(phase) = self.progress.phase(id) {
            let _ = self.events.send(SessionEvent::PhaseUpdated(phase.clone()));
        }
    }

    fn fail_active_phase(&mut self, error_label: impl Into<String>) {
        self.progress.fail_active_phase(error_label);
        if let Some(phase) = self
            .progress
            .phases()
            .iter()
            .find(|p| p.status == PhaseStatus::Error)
        {
            let _ = self.events.send(SessionEvent::PhaseUpdated(phase.clone()));
        }
    }

    fn collapse(&mut self) {
        self.progress.collapse();
        let _ = self.events.send(SessionEvent::RunCollapsed);
    }

    fn append(&mut self, message: Message) {
        self.log.append(message);
        if let Some(appended) = self.log.all().last() {
            let _ = self
                .events
                .send(SessionEvent::MessageAppended(appended.clone()));
        }
    }
}

/// Resolve a topic-list reply: a 1-based number picks from the list, otherwise
/// fuzzy-match against each topic's first word, otherwise take the input as a
/// fresh query.
fn resolve_topic_choice(input: &str, topics: &[String]) -> String {
    let trimmed = input.trim();

    if let Ok(index) = trimmed.parse::<usize>() {
        if (1..=topics.len()).contains(&index) {
            return topics[index - 1].clone();
        }
        return trimmed.to_string();
    }

    let lowered = trimmed.to_lowercase();
    for topic in topics {
        let first_word = topic
            .split_whitespace()
            .next()
            .unwrap_or(topic.as_str())
            .to_lowercase();
        if lowered.contains(&first_word) || first_word.contains(&lowered) {
            return topic.clone();
        }
    }

    trimmed.to_string()
}

fn quiz_prompt(questions: &[Question]) -> String {
    let mut content = String::from(
        "**📝 Quick Quiz!**\n\nAnswer with comma-separated letters, e.g. \"A, C, B\".\n",
    );
    for (index, question) in questions.iter().enumerate() {
        let _ = write!(content, "\n**{}.** {}\n", index + 1, question.question);
        for (letter, option) in ('A'..='Z').zip(&question.options) {
            let _ = writeln!(content, "   {letter}. {option}");
        }
    }
    content
}

fn explain_error_message(err: &ApiError) -> String {
    match err.kind {
        ApiErrorKind::RateLimit => {
            "The tutor is answering a lot of questions right now. Please wait a moment and try again."
                .to_string()
        }
        ApiErrorKind::Auth => "Your session is no longer authorized. Please log in again.".to_string(),
        ApiErrorKind::Network => {
            "I couldn't reach the tutor service. Check your connection and try again.".to_string()
        }
        ApiErrorKind::ServerError | ApiErrorKind::InvalidRequest | ApiErrorKind::Unknown => {
            "Sorry, something went wrong while answering your question. Please try again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{
        ExplainResponse, QuestionType, QuizFeedback, QuizGenerateResponse, QuizSubmitResponse,
        Source,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct InstantPacer;

    #[async_trait]
    impl Pacer for InstantPacer {
        async fn pause(&self, _duration: Duration) {}
    }

    /// Mock API that returns queued responses and records requests
    struct MockTutorApi {
        explain_responses: Mutex<VecDeque<Result<ExplainResponse, ApiError>>>,
        quiz_responses: Mutex<VecDeque<Result<QuizGenerateResponse, ApiError>>>,
        submit_responses: Mutex<VecDeque<Result<QuizSubmitResponse, ApiError>>>,
        explain_queries: Mutex<Vec<String>>,
        submissions: Mutex<Vec<(String, Vec<QuizAnswer>)>>,
    }

    impl MockTutorApi {
        fn new() -> Self {
            Self {
                explain_responses: Mutex::new(VecDeque::new()),
                quiz_responses: Mutex::new(VecDeque::new()),
                submit_responses: Mutex::new(VecDeque::new()),
                explain_queries: Mutex::new(Vec::new()),
                submissions: Mutex::new(Vec::new()),
            }
        }

        fn queue_explain(&self, response: Result<ExplainResponse, ApiError>) {
            self.explain_responses.lock().unwrap().push_back(response);
        }

        fn queue_quiz(&self, response: Result<QuizGenerateResponse, ApiError>) {
            self.quiz_responses.lock().unwrap().push_back(response);
        }

        fn queue_submit(&self, response: Result<QuizSubmitResponse, ApiError>) {
            self.submit_responses.lock().unwrap().push_back(response);
        }

        fn recorded_queries(&self) -> Vec<String> {
            self.explain_queries.lock().unwrap().clone()
        }

        fn recorded_submissions(&self) -> Vec<(String, Vec<QuizAnswer>)> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TutorApi for MockTutorApi {
        async fn explain(&self, query: &str) -> Result<ExplainResponse, ApiError> {
            self.explain_queries.lock().unwrap().push(query.to_string());
            self.explain_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::network("no mock response queued")))
        }

        async fn generate_quiz(
            &self,
            _session_id: &str,
            _difficulty: &str,
        ) -> Result<QuizGenerateResponse, ApiError> {
            self.quiz_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::network("no mock response queued")))
        }

        async fn submit_quiz(
            &self,
            quiz_id: &str,
            answers: Vec<QuizAnswer>,
        ) -> Result<QuizSubmitResponse, ApiError> {
            self.submissions
                .lock()
                .unwrap()
                .push((quiz_id.to_string(), answers));
            self.submit_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::network("no mock response queued")))
        }
    }

    fn controller(api: Arc<MockTutorApi>) -> SessionController {
        SessionController::new(api, Arc::new(InstantPacer))
    }

    fn explain_response(topic: &str) -> ExplainResponse {
        ExplainResponse {
            explanation: format!("{topic} is a fundamental concept."),
            sources: vec![
                Source {
                    title: "Britannica".to_string(),
                    url: "https://example.com/1".to_string(),
                    snippet: "An overview.".to_string(),
                    source_type: "encyclopedia".to_string(),
                },
                Source {
                    title: "Khan Academy".to_string(),
                    url: "https://example.com/2".to_string(),
                    snippet: "A lesson.".to_string(),
                    source_type: "course".to_string(),
                },
            ],
            svg_flashcard: Some("<svg/>".to_string()),
            session_id: "sess-1".to_string(),
            keywords: vec!["force".to_string(), "mass".to_string()],
        }
    }

    fn mc_question(id: &str, options: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            question: format!("Question {id}?"),
            question_type: QuestionType::MultipleChoice,
            options: options.iter().map(ToString::to_string).collect(),
            correct_answer: None,
            sample_answer: None,
            explanation: String::new(),
        }
    }

    fn five_question_quiz() -> QuizGenerateResponse {
        QuizGenerateResponse {
            quiz_id: "quiz-1".to_string(),
            questions: (1..=5)
                .map(|n| mc_question(&format!("q{n}"), &["Opt A", "Opt B", "Opt C", "Opt D"]))
                .collect(),
        }
    }

    fn graded(score: f64, correct: u32, total: u32) -> QuizSubmitResponse {
        QuizSubmitResponse {
            score,
            correct_answers: correct,
            total_questions: total,
            mastery_achieved: score >= 90.0,
            feedback: (1..=total)
                .map(|n| QuizFeedback {
                    question_id: format!("q{n}"),
                    correct: n <= correct,
                    correct_answer: Some("Opt A".to_string()),
                    sample_answer: None,
                    explanation: "Remember the definition.".to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn end_to_end_gravity_session() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Ok(explain_response("Gravity")));
        api.queue_quiz(Ok(five_question_quiz()));
        api.queue_submit(Ok(graded(80.0, 4, 5)));

        let mut session = controller(Arc::clone(&api));

        session.handle_input("What is gravity?").await;
        assert!(session.progress().is_collapsed());
        assert!(session.progress().all_terminal());
        {
            let messages = session.messages();
            assert_eq!(messages.len(), 3);
            assert!(messages[1].content.contains("fundamental concept"));
            assert!(messages[1].attachments.as_ref().unwrap().svg_flashcard.is_some());
            assert!(matches!(
                messages[2].routing,
                RoutingMetadata::ExpectingYesNo { .. }
            ));
        }

        session.handle_input("yes").await;
        {
            let quiz_msg = session.messages().last().unwrap();
            match &quiz_msg.routing {
                RoutingMetadata::ExpectingQuizAnswers {
                    quiz_id, questions, ..
                } => {
                    assert_eq!(quiz_id, "quiz-1");
                    assert_eq!(questions.len(), 5);
                }
                other => panic!("expected quiz routing, got {other:?}"),
            }
            assert!(quiz_msg.attachments.as_ref().unwrap().quiz.is_some());
        }

        session.handle_input("A,B,C,D,A").await;
        let submissions = api.recorded_submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].0, "quiz-1");
        assert_eq!(submissions[0].1[0].answer, "Opt A");
        assert_eq!(submissions[0].1[1].answer, "Opt B");

        let messages = session.messages();
        let report = &messages[messages.len() - 2];
        assert!(report.content.contains("**Score: 80%** (4/5 correct)"));

        // quiz completion rolls into gravity-family related topics
        let topics_msg = messages.last().unwrap();
        match &topics_msg.routing {
            RoutingMetadata::ExpectingTopicChoice { topics, last_topic } => {
                assert_eq!(topics[0], "Newton's laws of motion");
                assert_eq!(last_topic, "What is gravity?");
            }
            other => panic!("expected topic routing, got {other:?}"),
        }
        assert!(session.progress().is_collapsed());
        assert!(session.progress().all_terminal());
    }

    #[tokio::test]
    async fn explain_failure_fails_phase_and_appends_error() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Err(ApiError::rate_limit("429 slow down")));

        let mut session = controller(api);
        session.handle_input("What is entropy?").await;

        assert!(session.progress().is_collapsed());
        assert!(session.progress().all_terminal());
        assert!(session
            .progress()
            .phases()
            .iter()
            .any(|p| p.status == PhaseStatus::Error));

        let last = session.messages().last().unwrap();
        assert!(last.is_error);
        assert!(last.content.contains("wait a moment"));
        assert_eq!(last.routing, RoutingMetadata::None);
    }

    #[tokio::test]
    async fn answer_count_mismatch_keeps_quiz_routing_and_skips_the_api() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Ok(explain_response("Gravity")));
        api.queue_quiz(Ok(five_question_quiz()));

        let mut session = controller(Arc::clone(&api));
        session.handle_input("What is gravity?").await;
        session.handle_input("yes").await;
        session.handle_input("A, B").await;

        assert!(api.recorded_submissions().is_empty());

        let last = session.messages().last().unwrap();
        assert!(last.is_error);
        assert!(last.content.contains("exactly 5 answers"));
        match &last.routing {
            RoutingMetadata::ExpectingQuizAnswers { questions, .. } => {
                assert_eq!(questions.len(), 5);
            }
            other => panic!("expected retained quiz routing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn declining_the_quiz_suggests_related_topics() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Ok(explain_response("Gravity")));

        let mut session = controller(api);
        session.handle_input("gravity").await;
        session.handle_input("no thanks").await;

        let last = session.messages().last().unwrap();
        assert!(last.content.contains("Related topics"));
        match &last.routing {
            RoutingMetadata::ExpectingTopicChoice { topics, .. } => {
                assert_eq!(topics.len(), 5);
            }
            other => panic!("expected topic routing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn quiz_generation_failure_falls_through_to_topics() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Ok(explain_response("Gravity")));
        api.queue_quiz(Err(ApiError::server_error("500 boom")));

        let mut session = controller(api);
        session.handle_input("gravity").await;
        session.handle_input("yes").await;

        let messages = session.messages();
        let error_msg = &messages[messages.len() - 2];
        assert!(error_msg.is_error);
        assert!(matches!(
            messages.last().unwrap().routing,
            RoutingMetadata::ExpectingTopicChoice { .. }
        ));
        assert!(session.progress().is_collapsed());
        assert!(session.progress().all_terminal());
    }

    #[tokio::test]
    async fn numeric_topic_choice_explains_that_topic() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Ok(explain_response("Gravity")));
        api.queue_explain(Ok(explain_response("Orbital mechanics")));

        let mut session = controller(Arc::clone(&api));
        session.handle_input("gravity").await;
        session.handle_input("nope").await;
        session.handle_input("2").await;

        let queries = api.recorded_queries();
        assert_eq!(queries.last().unwrap(), "Orbital mechanics");
    }

    #[tokio::test]
    async fn out_of_range_topic_choice_becomes_the_query() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Ok(explain_response("Gravity")));
        api.queue_explain(Ok(explain_response("7")));

        let mut session = controller(Arc::clone(&api));
        session.handle_input("gravity").await;
        session.handle_input("no").await;
        session.handle_input("7").await;

        assert_eq!(api.recorded_queries().last().unwrap(), "7");
    }

    #[tokio::test]
    async fn structured_selections_submit_in_question_order() {
        let api = Arc::new(MockTutorApi::new());
        api.queue_explain(Ok(explain_response("Gravity")));
        api.queue_quiz(Ok(five_question_quiz()));
        api.queue_submit(Ok(graded(100.0, 5, 5)));

        let mut session = controller(Arc::clone(&api));
        session.handle_input("gravity").await;
        session.handle_input("y").await;

        let mut selections = HashMap::new();
        for n in 1..=5 {
            selections.insert(format!("q{n}"), "Opt A".to_string());
        }
        session.submit_quiz_selections(&selections).await;

        let submissions = api.recorded_submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].1.len(), 5);
        assert_eq!(submissions[0].1[4].question_id, "q5");

        let messages = session.messages();
        let report = messages
            .iter()
            .rev()
            .find(|m| m.content.contains("Quiz Results"))
            .unwrap();
        assert!(report.content.contains("mastered this concept"));
    }

    #[test]
    fn fuzzy_topic_choice_matches_first_word() {
        let topics = vec![
            "Newton's laws of motion".to_string(),
            "Orbital mechanics".to_string(),
        ];
        assert_eq!(
            resolve_topic_choice("orbital stuff", &topics),
            "Orbital mechanics"
        );
        assert_eq!(resolve_topic_choice("black holes", &topics), "black holes");
    }

    #[test]
    fn quiz_prompt_letters_the_options() {
        let prompt = quiz_prompt(&[mc_question("q1", &["First", "Second"])]);
        assert!(prompt.contains("**1.** Question q1?"));
        assert!(prompt.contains("A. First"));
        assert!(prompt.contains("B. Second"));
    }
}
