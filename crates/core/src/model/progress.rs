use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CourseId, VideoId};

/// Watch percentage at which a video counts as completed.
pub const COMPLETION_THRESHOLD: f64 = 90.0;

/// Per-course record of which videos were watched and how far.
///
/// The local cache and the remote store both hold this shape; the remote
/// copy is authoritative on initial load, the local copy afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    course_id: CourseId,
    completed: BTreeSet<VideoId>,
    video_progress: BTreeMap<VideoId, f64>,
    last_updated: DateTime<Utc>,
}

impl ProgressRecord {
    /// Returns an empty record for a course with no recorded progress.
    #[must_use]
    pub fn empty(course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            course_id,
            completed: BTreeSet::new(),
            video_progress: BTreeMap::new(),
            last_updated: now,
        }
    }

    /// Rehydrate a record from persisted parts.
    ///
    /// Percentages are clamped into `[0, 100]`; completion flags are taken
    /// as stored (completion is monotonic, so a stored flag stands even if
    /// the stored percentage has since drifted below the threshold).
    #[must_use]
    pub fn from_parts(
        course_id: CourseId,
        completed: BTreeSet<VideoId>,
        video_progress: BTreeMap<VideoId, f64>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let video_progress = video_progress
            .into_iter()
            .map(|(id, pct)| (id, pct.clamp(0.0, 100.0)))
            .collect();
        Self {
            course_id,
            completed,
            video_progress,
            last_updated,
        }
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn completed(&self) -> &BTreeSet<VideoId> {
        &self.completed
    }

    #[must_use]
    pub fn video_progress(&self) -> &BTreeMap<VideoId, f64> {
        &self.video_progress
    }

    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn is_completed(&self, video: &VideoId) -> bool {
        self.completed.contains(video)
    }

    /// Records a playback position for a video.
    ///
    /// The percentage is clamped into `[0, 100]`. The video enters the
    /// completed set the first time its percentage reaches
    /// [`COMPLETION_THRESHOLD`]; once set, the flag never comes back off,
    /// even if later ticks report a lower position (seeking backwards).
    ///
    /// Returns `true` if this tick completed the video.
    pub fn record_tick(&mut self, video: VideoId, percent: f64, now: DateTime<Utc>) -> bool {
        let percent = percent.clamp(0.0, 100.0);
        self.last_updated = now;

        let newly_completed =
            percent >= COMPLETION_THRESHOLD && !self.completed.contains(&video);
        if newly_completed {
            self.completed.insert(video.clone());
        }
        self.video_progress.insert(video, percent);
        newly_completed
    }

    /// Marks a video completed regardless of its recorded percentage.
    ///
    /// Used when playback ends: the player reports the end event without a
    /// final position tick.
    ///
    /// Returns `true` if the video was not already completed.
    pub fn mark_completed(&mut self, video: VideoId, now: DateTime<Utc>) -> bool {
        self.last_updated = now;
        self.video_progress.insert(video.clone(), 100.0);
        self.completed.insert(video)
    }

    /// Drops videos that do not belong to the course.
    ///
    /// Applied when adopting a remote record, so that `completed` stays a
    /// subset of the course's known video identifiers.
    pub fn retain_videos(&mut self, known: &BTreeSet<VideoId>) {
        self.completed.retain(|id| known.contains(id));
        self.video_progress.retain(|id, _| known.contains(id));
    }

    /// Overall completion percentage out of `total_videos`.
    ///
    /// A course with no videos reports 0.
    #[must_use]
    pub fn overall_percent(&self, total_videos: usize) -> u8 {
        if total_videos == 0 {
            return 0;
        }
        let ratio = self.completed.len() as f64 / total_videos as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (ratio * 100.0).round().min(100.0) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn record() -> ProgressRecord {
        ProgressRecord::empty(CourseId::new("c1"), fixed_now())
    }

    #[test]
    fn empty_record_has_no_progress() {
        let rec = record();
        assert!(rec.completed().is_empty());
        assert!(rec.video_progress().is_empty());
    }

    #[test]
    fn tick_below_threshold_does_not_complete() {
        let mut rec = record();
        let done = rec.record_tick(VideoId::new("v1"), 89.9, fixed_now());
        assert!(!done);
        assert!(!rec.is_completed(&VideoId::new("v1")));
    }

    #[test]
    fn tick_at_threshold_completes() {
        let mut rec = record();
        let done = rec.record_tick(VideoId::new("v1"), 90.0, fixed_now());
        assert!(done);
        assert!(rec.is_completed(&VideoId::new("v1")));
    }

    #[test]
    fn completion_is_monotonic() {
        let mut rec = record();
        rec.record_tick(VideoId::new("v1"), 95.0, fixed_now());
        // Seek back to the start; the flag must survive.
        let done_again = rec.record_tick(VideoId::new("v1"), 5.0, fixed_now());
        assert!(!done_again);
        assert!(rec.is_completed(&VideoId::new("v1")));
        assert_eq!(rec.video_progress()[&VideoId::new("v1")], 5.0);
    }

    #[test]
    fn second_pass_over_threshold_is_not_newly_completed() {
        let mut rec = record();
        assert!(rec.record_tick(VideoId::new("v1"), 92.0, fixed_now()));
        assert!(!rec.record_tick(VideoId::new("v1"), 99.0, fixed_now()));
        assert_eq!(rec.completed_count(), 1);
    }

    #[test]
    fn percent_is_clamped() {
        let mut rec = record();
        rec.record_tick(VideoId::new("v1"), 140.0, fixed_now());
        assert_eq!(rec.video_progress()[&VideoId::new("v1")], 100.0);
        rec.record_tick(VideoId::new("v2"), -3.0, fixed_now());
        assert_eq!(rec.video_progress()[&VideoId::new("v2")], 0.0);
    }

    #[test]
    fn mark_completed_forces_the_flag() {
        let mut rec = record();
        assert!(rec.mark_completed(VideoId::new("v1"), fixed_now()));
        assert!(!rec.mark_completed(VideoId::new("v1"), fixed_now()));
        assert_eq!(rec.video_progress()[&VideoId::new("v1")], 100.0);
    }

    #[test]
    fn retain_videos_drops_unknown_ids() {
        let mut rec = record();
        rec.record_tick(VideoId::new("v1"), 95.0, fixed_now());
        rec.record_tick(VideoId::new("ghost"), 95.0, fixed_now());

        let known: BTreeSet<VideoId> = [VideoId::new("v1"), VideoId::new("v2")]
            .into_iter()
            .collect();
        rec.retain_videos(&known);

        assert!(rec.is_completed(&VideoId::new("v1")));
        assert!(!rec.is_completed(&VideoId::new("ghost")));
        assert!(!rec.video_progress().contains_key(&VideoId::new("ghost")));
    }

    #[test]
    fn overall_percent_rounds() {
        let mut rec = record();
        rec.record_tick(VideoId::new("v1"), 95.0, fixed_now());
        assert_eq!(rec.overall_percent(3), 33);
        rec.record_tick(VideoId::new("v2"), 95.0, fixed_now());
        assert_eq!(rec.overall_percent(3), 67);
        assert_eq!(rec.overall_percent(0), 0);
    }
}
