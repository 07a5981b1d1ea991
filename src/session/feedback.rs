//! Quiz answer normalization and the graded result report

use crate::api::types::{Question, QuizAnswer, QuizFeedback, QuizSubmitResponse};
use std::collections::HashMap;
use std::fmt::Write as _;
use thiserror::Error;

/// Answer count did not match the question count; no submission was made
#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected {expected} answers, got {got}")]
pub struct AnswerCountMismatch {
    pub expected: usize,
    pub got: usize,
}

/// Normalize a comma-separated letter list ("A, B, C") against the question
/// list. Letters map positionally to option text; a letter with no matching
/// option falls back to the raw letter.
pub fn letter_answers(
    input: &str,
    questions: &[Question],
) -> Result<Vec<QuizAnswer>, AnswerCountMismatch> {
    let letters: Vec<String> = input
        .split(',')
        .map(|part| part.trim().to_uppercase())
        .collect();

    if letters.len() != questions.len() {
        return Err(AnswerCountMismatch {
            expected: questions.len(),
            got: letters.len(),
        });
    }

    let answers = letters
        .iter()
        .zip(questions)
        .map(|(letter, question)| {
            let answer = letter
                .chars()
                .next()
                .filter(char::is_ascii_uppercase)
                .map(|c| (c as usize) - ('A' as usize))
                .and_then(|index| question.options.get(index))
                .cloned()
                .unwrap_or_else(|| letter.clone());

            QuizAnswer {
                question_id: question.id.clone(),
                answer,
            }
        })
        .collect();

    Ok(answers)
}

/// Normalize a question-id -> selected-option-text map in question order.
/// Unanswered questions submit an empty answer, mirroring the interactive
/// selector's behavior.
pub fn selection_answers(
    selected: &HashMap<String, String>,
    questions: &[Question],
) -> Vec<QuizAnswer> {
    questions
        .iter()
        .map(|question| QuizAnswer {
            question_id: question.id.clone(),
            answer: selected.get(&question.id).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Heuristically detected category of misunderstanding.
///
/// Derived by keyword-matching inside the grader's explanation strings for
/// incorrect answers. A heuristic over free text, not a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptGap {
    Definitions,
    Processes,
    Applications,
    Relationships,
    Formulas,
}

impl ConceptGap {
    /// User-facing phrase for this gap category
    pub fn label(self) -> &'static str {
        match self {
            ConceptGap::Definitions => "basic definitions",
            ConceptGap::Processes => "understanding processes",
            ConceptGap::Applications => "practical applications",
            ConceptGap::Relationships => "concept relationships",
            ConceptGap::Formulas => "mathematical concepts",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            ConceptGap::Definitions => &["definition", "meaning", "term"],
            ConceptGap::Processes => &["process", "mechanism", "how", "steps"],
            ConceptGap::Applications => &["application", "example", "use", "real-world"],
            ConceptGap::Relationships => &["relationship", "connection", "between", "related"],
            ConceptGap::Formulas => &["formula", "calculation", "equation", "mathematical"],
        }
    }
}

const ALL_GAPS: [ConceptGap; 5] = [
    ConceptGap::Definitions,
    ConceptGap::Processes,
    ConceptGap::Applications,
    ConceptGap::Relationships,
    ConceptGap::Formulas,
];

/// Scan the explanations of incorrect answers for gap categories.
/// Insertion-ordered, deduplicated.
pub fn detect_concept_gaps(feedback: &[QuizFeedback]) -> Vec<ConceptGap> {
    let mut gaps = Vec::new();

    for entry in feedback.iter().filter(|f| !f.correct) {
        let explanation = entry.explanation.to_lowercase();
        for gap in ALL_GAPS {
            if gaps.contains(&gap) {
                continue;
            }
            if gap.keywords().iter().any(|kw| explanation.contains(kw)) {
                gaps.push(gap);
            }
        }
    }

    gaps
}

/// Score tier driving recap, advice, and study-tip selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Mastery,
    Solid,
    Building,
}

impl Tier {
    fn for_result(result: &QuizSubmitResponse) -> Self {
        if result.mastery_achieved {
            Tier::Mastery
        } else if result.score >= 70.0 {
            Tier::Solid
        } else {
            Tier::Building
        }
    }
}

fn join_gap_labels(gaps: &[ConceptGap], max: usize) -> String {
    let labels: Vec<&str> = gaps.iter().take(max).map(|g| g.label()).collect();
    if labels.len() == 2 {
        labels.join(" and ")
    } else {
        labels.join(", ")
    }
}

/// Build the full markdown quiz-results report
pub fn build_result_report(result: &QuizSubmitResponse) -> String {
    let tier = Tier::for_result(result);
    let gaps = detect_concept_gaps(&result.feedback);

    let mut report = String::from("**🎉 Quiz Results**\n\n");
    let _ = writeln!(
        report,
        "**Score: {:.0}%** ({}/{} correct)\n",
        result.score, result.correct_answers, result.total_questions
    );

    report.push_str(match tier {
        Tier::Mastery => "🏆 **Excellent! You've mastered this concept!**\n\n",
        Tier::Solid => "👏 **Good work! You're getting there.**\n\n",
        Tier::Building => "📚 **Keep studying - you'll get it next time!**\n\n",
    });

    for (index, feedback) in result.feedback.iter().enumerate() {
        let mark = if feedback.correct { "✅" } else { "❌" };
        let _ = write!(report, "**{}.** {mark} ", index + 1);
        if let Some(correct_answer) = &feedback.correct_answer {
            let _ = writeln!(report, "Correct answer: {correct_answer}");
        }
        let _ = writeln!(report, "{}\n", feedback.explanation);
    }

    let (recap, advice) = recap_and_advice(result, tier, &gaps);
    let _ = writeln!(report, "---\n\n**📈 Learning Recap:**\n{recap}\n");
    let _ = writeln!(report, "**🎯 Personalized Next Steps:**\n{advice}\n");

    report.push_str(&study_tips(tier, &gaps));
    report
}

fn recap_and_advice(
    result: &QuizSubmitResponse,
    tier: Tier,
    gaps: &[ConceptGap],
) -> (String, String) {
    match tier {
        Tier::Mastery => (
            "Outstanding performance! You demonstrated strong understanding across all key areas."
                .to_string(),
            "Consider exploring advanced applications or teaching this concept to someone else \
             to reinforce your mastery."
                .to_string(),
        ),

        Tier::Solid => {
            let mut recap = format!(
                "Good progress! You got {} out of {} questions correct.",
                result.correct_answers, result.total_questions
            );
            if !gaps.is_empty() {
                let _ = write!(
                    recap,
                    " Your main challenges were in {}.",
                    join_gap_labels(gaps, 2)
                );
            }

            let mut advice = String::from("Focus on the areas you missed. ");
            for gap in gaps {
                advice.push_str(match gap {
                    ConceptGap::Definitions => "Review key definitions and terminology. ",
                    ConceptGap::Processes => "Study the step-by-step processes and mechanisms. ",
                    ConceptGap::Applications => "Look for real-world examples and applications. ",
                    ConceptGap::Relationships => {
                        "Focus on how different concepts connect to each other. "
                    }
                    ConceptGap::Formulas => "Practice the mathematical relationships and formulas. ",
                });
            }
            if gaps.is_empty() {
                advice = "Review the specific questions you missed and try to understand the \
                          reasoning behind each correct answer."
                    .to_string();
            }
            (recap, advice)
        }

        Tier::Building => {
            let mut recap = format!(
                "You're building your foundation! You got {} out of {} questions correct.",
                result.correct_answers, result.total_questions
            );
            if !gaps.is_empty() {
                let _ = write!(
                    recap,
                    " The main areas to work on are {}.",
                    join_gap_labels(gaps, 3)
                );
            }

            let mut advice = String::from("Start with the fundamentals. ");
            if gaps.contains(&ConceptGap::Definitions) {
                advice.push_str("Make sure you understand the core definitions first. ");
            }
            if gaps.contains(&ConceptGap::Processes) {
                advice.push_str("Break down complex processes into simple steps. ");
            }
            advice.push_str(
                "Use visual aids, create your own examples, and practice explaining concepts \
                 in simple terms.",
            );
            (recap, advice)
        }
    }
}

fn study_tips(tier: Tier, gaps: &[ConceptGap]) -> String {
    let mut tips = String::new();

    if tier == Tier::Building {
        tips.push_str("**📝 Targeted Study Tips:**\n");
        for gap in gaps {
            tips.push_str(match gap {
                ConceptGap::Definitions => "• Create flashcards for key terms and definitions\n",
                ConceptGap::Processes => {
                    "• Draw flowcharts or diagrams showing step-by-step processes\n"
                }
                ConceptGap::Applications => "• Find real-world examples and case studies\n",
                ConceptGap::Relationships => "• Create concept maps showing how ideas connect\n",
                ConceptGap::Formulas => "• Practice calculations and work through example problems\n",
            });
        }
        if gaps.is_empty() {
            tips.push_str("• Review the explanations for questions you missed\n");
            tips.push_str("• Try explaining concepts in your own words\n");
            tips.push_str("• Look for patterns in your incorrect answers\n");
        }
        tips.push('\n');
    } else {
        tips.push_str("**🚀 Continue Building Mastery:**\n");
        if !gaps.is_empty() {
            let _ = writeln!(
                tips,
                "• Strengthen your understanding of {}",
                join_gap_labels(gaps, 2)
            );
        }
        tips.push_str("• Explore advanced applications of this concept\n");
        tips.push_str("• Try teaching this concept to someone else\n");
        tips.push_str("• Look for connections to related topics\n\n");
    }

    tips
}
