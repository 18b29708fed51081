use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// Score (0-100) at or above which the quiz counts as passed.
pub const PASS_THRESHOLD: u8 = 50;

/// A quiz attached to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub title: String,
    pub questions: Vec<Question>,
}

impl QuizDefinition {
    #[must_use]
    pub fn question_ids(&self) -> Vec<QuestionId> {
        self.questions.iter().map(|q| q.id.clone()).collect()
    }
}

/// One question and its correctness rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// The four supported question shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Exact equality with the recorded correct option identifier.
    SingleChoice { correct: String },
    /// Set equality with the correct option identifiers, order irrelevant.
    MultiSelect { correct: BTreeSet<String> },
    /// Case- and language-insensitive true/false comparison.
    TrueFalse { correct: bool },
    /// Token-overlap comparison against a reference answer.
    FreeText { reference: String },
}

/// A submitted answer: one option, several options, or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

impl Answer {
    #[must_use]
    pub fn single(value: impl Into<String>) -> Self {
        Self::Single(value.into())
    }

    #[must_use]
    pub fn multiple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Multiple(values.into_iter().map(Into::into).collect())
    }
}

/// Correctness verdict for one graded question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub feedback: String,
}

/// Result of grading a complete submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    answers: BTreeMap<QuestionId, Answer>,
    breakdown: Vec<QuestionOutcome>,
    score: u8,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Builds a result from graded outcomes.
    ///
    /// The score is `round(100 * correct / total)`; an empty breakdown
    /// scores 0.
    #[must_use]
    pub fn from_outcomes(
        answers: BTreeMap<QuestionId, Answer>,
        breakdown: Vec<QuestionOutcome>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let total = breakdown.len();
        let correct = breakdown.iter().filter(|o| o.is_correct).count();
        let score = if total == 0 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                (100.0 * correct as f64 / total as f64).round() as u8
            }
        };
        Self {
            answers,
            breakdown,
            score,
            completed_at,
        }
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, Answer> {
        &self.answers
    }

    #[must_use]
    pub fn breakdown(&self) -> &[QuestionOutcome] {
        &self.breakdown
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.breakdown.iter().filter(|o| o.is_correct).count()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.breakdown.len()
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// True when the score reaches [`PASS_THRESHOLD`].
    #[must_use]
    pub fn passed(&self) -> bool {
        self.score >= PASS_THRESHOLD
    }
}
