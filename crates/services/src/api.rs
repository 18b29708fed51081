//! HTTP client for the course-progress API.
//!
//! The remote store is authoritative on initial load and best-effort
//! afterwards. A 404 on fetch is an expected first-visit condition, not an
//! error. `ProgressRemote` is the seam the sync and quiz services depend
//! on, so tests can substitute an in-memory remote.

use std::collections::BTreeMap;
use std::env;

use async_trait::async_trait;
use campus_core::model::{CourseId, ProgressRecord, QuizResult, VideoId};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
}

impl ApiConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let token = env::var("CAMPUS_API_TOKEN").ok()?;
        if token.trim().is_empty() {
            return None;
        }
        let base_url = env::var("CAMPUS_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.campus.example/v1".into());
        Some(Self { base_url, token })
    }
}

/// Remote operations the services need from the progress API.
#[async_trait]
pub trait ProgressRemote: Send + Sync {
    /// Fetch the server-side progress record for a course.
    ///
    /// `Ok(None)` means the server has no record yet (first visit).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-404 error status.
    async fn fetch_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<ProgressRecord>, ApiError>;

    /// Push the current record to the server.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, an error status, or a
    /// `success: false` body.
    async fn push_progress(
        &self,
        course_id: &CourseId,
        record: &ProgressRecord,
        total_videos: usize,
    ) -> Result<(), ApiError>;

    /// Submit a graded quiz result.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or an error status.
    async fn submit_quiz_result(
        &self,
        course_id: &CourseId,
        result: &QuizResult,
    ) -> Result<(), ApiError>;
}

/// `reqwest`-backed implementation of [`ProgressRemote`].
#[derive(Clone)]
pub struct ProgressApi {
    client: Client,
    config: Option<ApiConfig>,
}

impl ProgressApi {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ApiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&ApiConfig, ApiError> {
        self.config.as_ref().ok_or(ApiError::Disabled)
    }

    fn url(config: &ApiConfig, path: &str) -> String {
        format!("{}/{path}", config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ProgressRemote for ProgressApi {
    async fn fetch_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<ProgressRecord>, ApiError> {
        let config = self.config()?;
        let url = Self::url(config, &format!("course-progress/{course_id}"));

        let response = self
            .client
            .get(url)
            .bearer_auth(&config.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let body: FetchResponse = response.json().await?;
        if !body.success {
            return Err(ApiError::Rejected);
        }

        let Some(data) = body.data else {
            return Ok(None);
        };

        Ok(Some(ProgressRecord::from_parts(
            course_id.clone(),
            data.completed_videos.into_iter().collect(),
            data.video_progress,
            data.last_updated,
        )))
    }

    async fn push_progress(
        &self,
        course_id: &CourseId,
        record: &ProgressRecord,
        total_videos: usize,
    ) -> Result<(), ApiError> {
        let config = self.config()?;
        let url = Self::url(config, &format!("course-progress/{course_id}"));

        let payload = PushRequest {
            completed_videos: record.completed().iter().cloned().collect(),
            video_progress: record.video_progress().clone(),
            total_videos,
            overall_progress: record.overall_percent(total_videos),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }

        let body: AckResponse = response.json().await?;
        if !body.success {
            return Err(ApiError::Rejected);
        }
        Ok(())
    }

    async fn submit_quiz_result(
        &self,
        course_id: &CourseId,
        result: &QuizResult,
    ) -> Result<(), ApiError> {
        let config = self.config()?;
        let url = Self::url(config, &format!("courses/{course_id}/quiz-result"));

        let payload = QuizSubmission {
            score: result.score(),
            correct_answers: result.correct_count(),
            total_questions: result.total_questions(),
            answers: serde_json::to_value(result.answers()).unwrap_or_default(),
            completed_at: result.completed_at(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    success: bool,
    data: Option<RemoteRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRecord {
    completed_videos: Vec<VideoId>,
    video_progress: BTreeMap<VideoId, f64>,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest {
    completed_videos: Vec<VideoId>,
    video_progress: BTreeMap<VideoId, f64>,
    total_videos: usize,
    overall_progress: u8,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizSubmission {
    score: u8,
    correct_answers: usize,
    total_questions: usize,
    answers: serde_json::Value,
    completed_at: DateTime<Utc>,
}
