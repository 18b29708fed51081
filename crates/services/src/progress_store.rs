//! Local progress cache with the original product's forgiving semantics:
//! reads never fail (missing or corrupt data comes back as an empty
//! record) and write failures are swallowed after a log line. The worst
//! case is a stale or reset progress display, never a blocked player.

use std::sync::Arc;

use campus_core::Clock;
use campus_core::model::{CourseId, ProgressRecord};
use storage::repository::ProgressRepository;
use tracing::warn;

use crate::signals::{SignalHub, SignalKind};

#[derive(Clone)]
pub struct LocalProgressStore {
    repo: Arc<dyn ProgressRepository>,
    hub: SignalHub,
    clock: Clock,
}

impl LocalProgressStore {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>, hub: SignalHub, clock: Clock) -> Self {
        Self { repo, hub, clock }
    }

    /// Loads the cached record for a course.
    ///
    /// Missing and unreadable records both come back as an empty record;
    /// corruption is logged and treated as absence.
    pub async fn load(&self, course_id: &CourseId) -> ProgressRecord {
        match self.repo.get_progress(course_id).await {
            Ok(Some(record)) => record,
            Ok(None) => ProgressRecord::empty(course_id.clone(), self.clock.now()),
            Err(err) => {
                warn!(course = %course_id, error = %err, "unreadable local progress, starting empty");
                ProgressRecord::empty(course_id.clone(), self.clock.now())
            }
        }
    }

    /// Persists a record and notifies live views.
    ///
    /// Storage failures are logged and swallowed; the in-memory record the
    /// caller holds stays valid either way, and no signal is published for
    /// a write that did not land.
    pub async fn save(&self, record: &ProgressRecord) {
        match self.repo.upsert_progress(record).await {
            Ok(()) => {
                self.hub
                    .publish(record.course_id(), SignalKind::ProgressChanged);
            }
            Err(err) => {
                warn!(course = %record.course_id(), error = %err, "failed to persist local progress");
            }
        }
    }
}
