//! Client-side quiz grading.
//!
//! Four question shapes, each with its own correctness rule. Free-text
//! answers are graded with a lenient bag-of-words overlap against the
//! reference answer; the rule sits behind [`TextMatcher`] so a stricter
//! matcher can be plugged in per grader.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    Answer, Question, QuestionId, QuestionKind, QuestionOutcome, QuizDefinition, QuizResult,
};

/// Fraction of reference tokens that must appear in the user's answer.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradeError {
    /// The submission left questions unanswered; nothing was graded.
    #[error("{} question(s) left unanswered", .missing.len())]
    Unanswered { missing: Vec<QuestionId> },
}

/// Strategy for matching a free-text answer against a reference.
pub trait TextMatcher: Send + Sync {
    fn is_match(&self, reference: &str, answer: &str) -> bool;
}

/// Bag-of-words overlap: correct iff the fraction of reference tokens
/// present in the answer's token set reaches the threshold.
///
/// Lenient by design; it checks vocabulary coverage, not meaning.
#[derive(Debug, Clone, Copy)]
pub struct KeywordOverlap {
    threshold: f64,
}

impl KeywordOverlap {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for KeywordOverlap {
    fn default() -> Self {
        Self::new(SIMILARITY_THRESHOLD)
    }
}

impl TextMatcher for KeywordOverlap {
    fn is_match(&self, reference: &str, answer: &str) -> bool {
        let reference_tokens = tokenize(reference);
        if reference_tokens.is_empty() {
            return true;
        }
        let answer_tokens: BTreeSet<String> = tokenize(answer).into_iter().collect();
        let hits = reference_tokens
            .iter()
            .filter(|token| answer_tokens.contains(*token))
            .count();
        hits as f64 / reference_tokens.len() as f64 >= self.threshold
    }
}

/// Strict matcher: normalized answer must equal the normalized reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl TextMatcher for ExactMatch {
    fn is_match(&self, reference: &str, answer: &str) -> bool {
        normalize(reference) == normalize(answer)
    }
}

/// Grades a full submission against a quiz definition.
pub struct Grader {
    text_matcher: Box<dyn TextMatcher>,
}

impl Default for Grader {
    fn default() -> Self {
        Self::new(KeywordOverlap::default())
    }
}

impl Grader {
    #[must_use]
    pub fn new(text_matcher: impl TextMatcher + 'static) -> Self {
        Self {
            text_matcher: Box::new(text_matcher),
        }
    }

    /// Grades `answers` against `quiz`.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::Unanswered`] if any question lacks an answer;
    /// no partial result is produced in that case.
    pub fn grade(
        &self,
        quiz: &QuizDefinition,
        answers: &BTreeMap<QuestionId, Answer>,
        completed_at: DateTime<Utc>,
    ) -> Result<QuizResult, GradeError> {
        let missing: Vec<QuestionId> = quiz
            .questions
            .iter()
            .filter(|q| !answers.contains_key(&q.id))
            .map(|q| q.id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(GradeError::Unanswered { missing });
        }

        let breakdown = quiz
            .questions
            .iter()
            .map(|question| {
                let answer = &answers[&question.id];
                let is_correct = self.check(question, answer);
                QuestionOutcome {
                    question_id: question.id.clone(),
                    is_correct,
                    feedback: if is_correct {
                        "Bonne réponse".to_string()
                    } else {
                        "Réponse incorrecte".to_string()
                    },
                }
            })
            .collect();

        Ok(QuizResult::from_outcomes(
            answers.clone(),
            breakdown,
            completed_at,
        ))
    }

    fn check(&self, question: &Question, answer: &Answer) -> bool {
        match (&question.kind, answer) {
            (QuestionKind::SingleChoice { correct }, Answer::Single(selected)) => {
                selected == correct
            }
            (QuestionKind::MultiSelect { correct }, Answer::Multiple(selected)) => {
                let selected: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
                let expected: BTreeSet<&str> = correct.iter().map(String::as_str).collect();
                selected == expected
            }
            (QuestionKind::TrueFalse { correct }, Answer::Single(selected)) => {
                parse_truth_token(selected) == Some(*correct)
            }
            (QuestionKind::FreeText { reference }, Answer::Single(text)) => {
                self.text_matcher.is_match(reference, text)
            }
            // Answer shape does not fit the question shape.
            _ => false,
        }
    }
}

/// Parses an English or French true/false token, case-insensitively.
#[must_use]
pub fn parse_truth_token(raw: &str) -> Option<bool> {
    match normalize(raw).as_str() {
        "true" | "vrai" => Some(true),
        "false" | "faux" => Some(false),
        _ => None,
    }
}

/// Lowercases, folds French diacritics, and drops non-alphanumerics
/// (whitespace is kept as the token separator).
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.to_lowercase().chars() {
        match ch {
            'à' | 'â' | 'ä' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' => out.push('i'),
            'ô' | 'ö' => out.push('o'),
            'ù' | 'û' | 'ü' => out.push('u'),
            'ç' => out.push('c'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            c if c.is_alphanumeric() => out.push(c),
            c if c.is_whitespace() => out.push(' '),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Splits a normalized string into comparison tokens.
///
/// Tokens shorter than three characters are filler ("de", "à", "le") and
/// are dropped so they neither pad nor dilute the overlap score.
fn tokenize(raw: &str) -> Vec<String> {
    normalize(raw)
        .split_whitespace()
        .filter(|token| token.chars().count() >= 3)
        .map(ToString::to_string)
        .collect()
}
