//! Keeps the local progress cache and the remote store in step.
//!
//! On initial load the remote record is authoritative when it is present
//! and no older than the cache; otherwise the cache stands in. After that,
//! every mutation lands in the local store first and is then pushed out.
//! A failed push is logged and dropped, never rolled back: local state is
//! eventually consistent with the server and never blocked by it.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use campus_core::Clock;
use campus_core::model::{CourseId, ProgressRecord, VideoId};
use tracing::{debug, warn};

use crate::api::ProgressRemote;
use crate::error::ApiError;
use crate::progress_store::LocalProgressStore;
use crate::telemetry::{TelemetrySink, TelemetryTick};

#[derive(Clone)]
pub struct ProgressSyncService {
    local: LocalProgressStore,
    remote: Arc<dyn ProgressRemote>,
    clock: Clock,
}

impl ProgressSyncService {
    #[must_use]
    pub fn new(local: LocalProgressStore, remote: Arc<dyn ProgressRemote>, clock: Clock) -> Self {
        Self {
            local,
            remote,
            clock,
        }
    }

    /// Resolves the starting record for a course.
    ///
    /// The remote record wins when it exists and is no older than the
    /// cache; it is filtered against `known_videos` before adoption so the
    /// completed set stays a subset of the course's videos. A missing
    /// remote record (first visit) and any fetch failure both fall back to
    /// the cache.
    pub async fn initial_load(
        &self,
        course_id: &CourseId,
        known_videos: &BTreeSet<VideoId>,
    ) -> ProgressRecord {
        let local = self.local.load(course_id).await;

        let mut remote = match self.remote.fetch_progress(course_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(course = %course_id, "no remote progress yet");
                return local;
            }
            Err(ApiError::Disabled) => {
                debug!(course = %course_id, "remote API disabled, using local cache");
                return local;
            }
            Err(err) => {
                warn!(course = %course_id, error = %err, "remote fetch failed, using local cache");
                return local;
            }
        };

        remote.retain_videos(known_videos);

        let local_is_empty = local.completed().is_empty() && local.video_progress().is_empty();
        if !local_is_empty && remote.last_updated() < local.last_updated() {
            // The server record predates the cache: a slow fetch racing a
            // newer push. Keep the newer local state.
            debug!(course = %course_id, "remote record is stale, keeping local cache");
            return local;
        }

        self.local.save(&remote).await;
        remote
    }

    /// Records a playback tick: local save first, then an immediate push
    /// if this tick completed the video. Intermediate ticks are left to
    /// the debounced telemetry path.
    ///
    /// Returns the updated record and whether the video was newly
    /// completed.
    pub async fn record_tick(
        &self,
        course_id: &CourseId,
        video: VideoId,
        percent: f64,
        total_videos: usize,
    ) -> (ProgressRecord, bool) {
        let mut record = self.local.load(course_id).await;
        let newly_completed = record.record_tick(video, percent, self.clock.now());
        self.local.save(&record).await;

        if newly_completed {
            self.push_remote(&record, total_videos).await;
        }
        (record, newly_completed)
    }

    /// Marks a video finished (playback ended): local save, then push.
    pub async fn finish_video(
        &self,
        course_id: &CourseId,
        video: VideoId,
        total_videos: usize,
    ) -> ProgressRecord {
        let mut record = self.local.load(course_id).await;
        record.mark_completed(video, self.clock.now());
        self.local.save(&record).await;

        self.push_remote(&record, total_videos).await;
        record
    }

    /// Pushes a record to the server. Failures are logged and dropped.
    pub async fn push_remote(&self, record: &ProgressRecord, total_videos: usize) {
        match self
            .remote
            .push_progress(record.course_id(), record, total_videos)
            .await
        {
            Ok(()) => {}
            Err(ApiError::Disabled) => {
                debug!(course = %record.course_id(), "remote API disabled, skipping push");
            }
            Err(err) => {
                warn!(course = %record.course_id(), error = %err, "remote progress push failed");
            }
        }
    }

    #[must_use]
    pub fn local(&self) -> &LocalProgressStore {
        &self.local
    }
}

/// Telemetry sink that forwards the coalesced tick's course record to the
/// remote store. The tick's values are already in the local cache by the
/// time the quiet period elapses; the flush only costs the network call.
pub struct RemotePushSink {
    sync: ProgressSyncService,
}

impl RemotePushSink {
    #[must_use]
    pub fn new(sync: ProgressSyncService) -> Self {
        Self { sync }
    }
}

#[async_trait]
impl TelemetrySink for RemotePushSink {
    async fn send(&self, tick: TelemetryTick) {
        let record = self.sync.local.load(&tick.course_id).await;
        self.sync.push_remote(&record, tick.total_videos).await;
    }
}
