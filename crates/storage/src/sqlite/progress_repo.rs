use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use campus_core::model::{CourseId, ProgressRecord, VideoId};
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{ProgressRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT completed, video_progress, last_updated
            FROM course_progress
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

        let completed_json: String = row
            .try_get("completed")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let progress_json: String = row
            .try_get("video_progress")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let last_updated: DateTime<Utc> = row
            .try_get("last_updated")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        let completed: BTreeSet<VideoId> = serde_json::from_str(&completed_json)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let video_progress: BTreeMap<VideoId, f64> = serde_json::from_str(&progress_json)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Ok(Some(ProgressRecord::from_parts(
            course_id.clone(),
            completed,
            video_progress,
            last_updated,
        )))
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let completed_json = serde_json::to_string(record.completed())
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        let progress_json = serde_json::to_string(record.video_progress())
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO course_progress (course_id, completed, video_progress, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(course_id) DO UPDATE SET
                completed = excluded.completed,
                video_progress = excluded.video_progress,
                last_updated = excluded.last_updated
            ",
        )
        .bind(record.course_id().as_str())
        .bind(completed_json)
        .bind(progress_json)
        .bind(record.last_updated())
        .execute(self.pool())
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
