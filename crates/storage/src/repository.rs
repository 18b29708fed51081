use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use campus_core::model::{CourseId, ProgressRecord, QuizResult};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for per-course progress records.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the progress record for a course, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or deserialization failure.
    /// A missing record is `Ok(None)`, not an error.
    async fn get_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Persist or replace the progress record for its course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;
}

/// Repository contract for locally cached quiz state: the last graded
/// result and the certificate-unlock flag.
///
/// The flag is persisted separately from the result on purpose; the score
/// is display state, the flag gates the certificate.
#[async_trait]
pub trait QuizStateRepository: Send + Sync {
    /// Fetch the last stored quiz result for a course, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or deserialization failure.
    async fn get_result(&self, course_id: &CourseId)
    -> Result<Option<QuizResult>, StorageError>;

    /// Persist a quiz result, replacing any previous attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn save_result(
        &self,
        course_id: &CourseId,
        result: &QuizResult,
    ) -> Result<(), StorageError>;

    /// Read the certificate-unlock flag; absent means locked.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failure.
    async fn certificate_unlocked(&self, course_id: &CourseId) -> Result<bool, StorageError>;

    /// Persist the certificate-unlock flag.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the flag cannot be stored.
    async fn set_certificate_unlocked(
        &self,
        course_id: &CourseId,
        unlocked: bool,
    ) -> Result<(), StorageError>;

    /// Remove the stored result and the flag for a course (quiz retry).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failure. Clearing state that
    /// was never written is not an error.
    async fn clear_quiz_state(&self, course_id: &CourseId) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<CourseId, ProgressRecord>>>,
    results: Arc<Mutex<HashMap<CourseId, QuizResult>>>,
    certificates: Arc<Mutex<HashMap<CourseId, bool>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(course_id).cloned())
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.course_id().clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl QuizStateRepository for InMemoryRepository {
    async fn get_result(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<QuizResult>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(course_id).cloned())
    }

    async fn save_result(
        &self,
        course_id: &CourseId,
        result: &QuizResult,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(course_id.clone(), result.clone());
        Ok(())
    }

    async fn certificate_unlocked(&self, course_id: &CourseId) -> Result<bool, StorageError> {
        let guard = self
            .certificates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(course_id).copied().unwrap_or(false))
    }

    async fn set_certificate_unlocked(
        &self,
        course_id: &CourseId,
        unlocked: bool,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .certificates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(course_id.clone(), unlocked);
        Ok(())
    }

    async fn clear_quiz_state(&self, course_id: &CourseId) -> Result<(), StorageError> {
        let mut results = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        results.remove(course_id);
        drop(results);

        let mut certificates = self
            .certificates
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        certificates.remove(course_id);
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub quiz: Arc<dyn QuizStateRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let quiz: Arc<dyn QuizStateRepository> = Arc::new(repo);
        Self { progress, quiz }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use campus_core::model::{Answer, QuestionId, QuestionOutcome, VideoId};
    use campus_core::time::fixed_now;

    use super::*;

    fn build_result(score_of_two: usize) -> QuizResult {
        let breakdown = (0..2)
            .map(|i| QuestionOutcome {
                question_id: QuestionId::new(format!("q{i}")),
                is_correct: i < score_of_two,
                feedback: String::new(),
            })
            .collect();
        let answers = BTreeMap::from([(QuestionId::new("q0"), Answer::single("a"))]);
        QuizResult::from_outcomes(answers, breakdown, fixed_now())
    }

    #[tokio::test]
    async fn progress_round_trips() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("c1");

        let mut record = ProgressRecord::empty(course.clone(), fixed_now());
        record.record_tick(VideoId::new("v1"), 92.0, fixed_now());
        repo.upsert_progress(&record).await.unwrap();

        let loaded = repo.get_progress(&course).await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn missing_progress_is_none() {
        let repo = InMemoryRepository::new();
        let loaded = repo.get_progress(&CourseId::new("nope")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn quiz_state_clears_result_and_flag() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("c1");

        repo.save_result(&course, &build_result(2)).await.unwrap();
        repo.set_certificate_unlocked(&course, true).await.unwrap();
        assert!(repo.certificate_unlocked(&course).await.unwrap());

        repo.clear_quiz_state(&course).await.unwrap();
        assert!(repo.get_result(&course).await.unwrap().is_none());
        assert!(!repo.certificate_unlocked(&course).await.unwrap());
    }

    #[tokio::test]
    async fn retry_overwrites_previous_result() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("c1");

        repo.save_result(&course, &build_result(1)).await.unwrap();
        repo.save_result(&course, &build_result(2)).await.unwrap();

        let loaded = repo.get_result(&course).await.unwrap().unwrap();
        assert_eq!(loaded.score(), 100);
    }
}
