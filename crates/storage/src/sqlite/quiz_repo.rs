use std::collections::BTreeMap;

use async_trait::async_trait;
use campus_core::model::{Answer, CourseId, QuestionId, QuestionOutcome, QuizResult};
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{QuizStateRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl QuizStateRepository for SqliteRepository {
    async fn get_result(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<QuizResult>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT answers, breakdown, completed_at
            FROM quiz_results
            WHERE course_id = ?1
            ",
        )
        .bind(course_id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let answers_json: String = row
            .try_get("answers")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let breakdown_json: String = row
            .try_get("breakdown")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let completed_at: DateTime<Utc> = row
            .try_get("completed_at")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        let answers: BTreeMap<QuestionId, Answer> = serde_json::from_str(&answers_json)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let breakdown: Vec<QuestionOutcome> = serde_json::from_str(&breakdown_json)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        // The stored score column is redundant with the breakdown; the
        // result recomputes it on rehydration.
        Ok(Some(QuizResult::from_outcomes(
            answers,
            breakdown,
            completed_at,
        )))
    }

    async fn save_result(
        &self,
        course_id: &CourseId,
        result: &QuizResult,
    ) -> Result<(), StorageError> {
        let answers_json = serde_json::to_string(result.answers())
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let breakdown_json = serde_json::to_string(result.breakdown())
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO quiz_results (course_id, answers, breakdown, score, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(course_id) DO UPDATE SET
                answers = excluded.answers,
                breakdown = excluded.breakdown,
                score = excluded.score,
                completed_at = excluded.completed_at
            ",
        )
        .bind(course_id.as_str())
        .bind(answers_json)
        .bind(breakdown_json)
        .bind(i64::from(result.score()))
        .bind(result.completed_at())
        .execute(self.pool())
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn certificate_unlocked(&self, course_id: &CourseId) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r"
            SELECT unlocked
            FROM certificate_flags
            WHERE course_id = ?1
            ",
        )
        .bind(course_id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(false);
        };

        let unlocked: i64 = row
            .try_get("unlocked")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(unlocked != 0)
    }

    async fn set_certificate_unlocked(
        &self,
        course_id: &CourseId,
        unlocked: bool,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO certificate_flags (course_id, unlocked)
            VALUES (?1, ?2)
            ON CONFLICT(course_id) DO UPDATE SET
                unlocked = excluded.unlocked
            ",
        )
        .bind(course_id.as_str())
        .bind(i64::from(unlocked))
        .execute(self.pool())
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_quiz_state(&self, course_id: &CourseId) -> Result<(), StorageError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        sqlx::query("DELETE FROM quiz_results WHERE course_id = ?1")
            .bind(course_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        sqlx::query("DELETE FROM certificate_flags WHERE course_id = ?1")
            .bind(course_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        tx.commit()
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
