//! Quiz submission, local persistence, and the retry path.

use std::collections::BTreeMap;
use std::sync::Arc;

use campus_core::Clock;
use campus_core::grader::Grader;
use campus_core::model::{Answer, CourseId, QuestionId, QuizDefinition, QuizResult};
use storage::repository::QuizStateRepository;
use tracing::warn;

use crate::api::ProgressRemote;
use crate::error::QuizServiceError;
use crate::signals::{SignalHub, SignalKind};

pub struct QuizService {
    grader: Grader,
    repo: Arc<dyn QuizStateRepository>,
    remote: Arc<dyn ProgressRemote>,
    hub: SignalHub,
    clock: Clock,
}

impl QuizService {
    #[must_use]
    pub fn new(
        grader: Grader,
        repo: Arc<dyn QuizStateRepository>,
        remote: Arc<dyn ProgressRemote>,
        hub: SignalHub,
        clock: Clock,
    ) -> Self {
        Self {
            grader,
            repo,
            remote,
            hub,
            clock,
        }
    }

    /// Grades a submission, persists the result, and gates the
    /// certificate.
    ///
    /// The pass branch is the only writer of the certificate flag. The
    /// remote submission is best-effort: a failure is logged and the
    /// locally stored result stands.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Grade` for an incomplete submission
    /// (nothing is persisted) and `QuizServiceError::Storage` if the
    /// result cannot be stored locally.
    pub async fn submit(
        &self,
        course_id: &CourseId,
        quiz: &QuizDefinition,
        answers: &BTreeMap<QuestionId, Answer>,
    ) -> Result<QuizResult, QuizServiceError> {
        let result = self.grader.grade(quiz, answers, self.clock.now())?;

        self.repo.save_result(course_id, &result).await?;
        if result.passed() {
            self.repo.set_certificate_unlocked(course_id, true).await?;
        }

        if let Err(err) = self.remote.submit_quiz_result(course_id, &result).await {
            warn!(course = %course_id, error = %err, "quiz result submission failed");
        }

        self.hub.publish(course_id, SignalKind::QuizStateChanged);
        Ok(result)
    }

    /// Returns the last stored result for a course, if any.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on read failure.
    pub async fn last_result(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<QuizResult>, QuizServiceError> {
        Ok(self.repo.get_result(course_id).await?)
    }

    /// Clears all locally stored quiz state for a course: the last result
    /// and the certificate flag. The grader is stateless, so this returns
    /// the quiz to its initial condition.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the state cannot be cleared.
    pub async fn retry(&self, course_id: &CourseId) -> Result<(), QuizServiceError> {
        self.repo.clear_quiz_state(course_id).await?;
        self.hub.publish(course_id, SignalKind::QuizStateChanged);
        Ok(())
    }
}
