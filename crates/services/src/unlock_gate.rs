//! Derives quiz and certificate availability for a course.
//!
//! Nothing here is stored: the gate re-reads the local cache and the
//! persisted certificate flag on every call. Views hold a `SignalHub`
//! subscription and recompute when a `StateSignal` for their course
//! arrives.

use std::sync::Arc;

use campus_core::model::{CourseId, UnlockState};
use storage::repository::QuizStateRepository;
use tokio::sync::broadcast;
use tracing::warn;

use crate::progress_store::LocalProgressStore;
use crate::signals::{SignalHub, StateSignal};

#[derive(Clone)]
pub struct UnlockGate {
    progress: LocalProgressStore,
    quiz: Arc<dyn QuizStateRepository>,
    hub: SignalHub,
}

impl UnlockGate {
    #[must_use]
    pub fn new(
        progress: LocalProgressStore,
        quiz: Arc<dyn QuizStateRepository>,
        hub: SignalHub,
    ) -> Self {
        Self {
            progress,
            quiz,
            hub,
        }
    }

    /// Computes the current gate state for a course.
    ///
    /// Storage problems degrade to "locked" on the certificate side and an
    /// empty record on the progress side; the gate never fails outright.
    pub async fn compute(&self, course_id: &CourseId, total_videos: usize) -> UnlockState {
        let record = self.progress.load(course_id).await;

        let quiz_passed = match self.quiz.certificate_unlocked(course_id).await {
            Ok(flag) => flag,
            Err(err) => {
                warn!(course = %course_id, error = %err, "unreadable certificate flag, treating as locked");
                false
            }
        };

        UnlockState::derive(record.completed_count(), total_videos, quiz_passed)
    }

    /// Subscribes to change notifications for re-derivation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateSignal> {
        self.hub.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use campus_core::model::{ProgressRecord, VideoId};
    use campus_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, ProgressRepository, QuizStateRepository};

    use super::*;

    fn gate(repo: &InMemoryRepository) -> UnlockGate {
        let progress = LocalProgressStore::new(
            Arc::new(repo.clone()),
            SignalHub::new(),
            fixed_clock(),
        );
        UnlockGate::new(progress, Arc::new(repo.clone()), SignalHub::new())
    }

    async fn store_completed(repo: &InMemoryRepository, course: &CourseId, videos: &[&str]) {
        let mut record = ProgressRecord::empty(course.clone(), fixed_now());
        for video in videos {
            record.record_tick(VideoId::new(*video), 95.0, fixed_now());
        }
        repo.upsert_progress(&record).await.unwrap();
    }

    #[tokio::test]
    async fn quiz_stays_locked_until_every_video_is_done() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("c1");
        store_completed(&repo, &course, &["v1", "v2"]).await;

        let gate = gate(&repo);
        assert!(!gate.compute(&course, 3).await.quiz_unlocked);

        store_completed(&repo, &course, &["v1", "v2", "v3"]).await;
        assert!(gate.compute(&course, 3).await.quiz_unlocked);
    }

    #[tokio::test]
    async fn zero_video_course_unlocks_immediately() {
        let repo = InMemoryRepository::new();
        let gate = gate(&repo);

        let state = gate.compute(&CourseId::new("empty"), 0).await;
        assert!(state.quiz_unlocked);
        assert!(!state.certificate_unlocked);
    }

    #[tokio::test]
    async fn certificate_follows_the_persisted_flag() {
        let repo = InMemoryRepository::new();
        let course = CourseId::new("c1");
        let gate = gate(&repo);

        assert!(!gate.compute(&course, 0).await.certificate_unlocked);

        repo.set_certificate_unlocked(&course, true).await.unwrap();
        assert!(gate.compute(&course, 0).await.certificate_unlocked);
    }
}
