//! End-to-end flow over in-memory storage and a fake remote: watch every
//! video, unlock the quiz, pass it, unlock the certificate, retry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campus_core::model::{
    Answer, CourseId, ProgressRecord, Question, QuestionId, QuestionKind, QuizDefinition,
    QuizResult, VideoId,
};
use campus_core::time::fixed_clock;
use services::{
    ApiError, AppServices, ProgressRemote, SignalKind, TelemetryTick,
};

/// Remote that behaves like a tiny server: pushes overwrite its record,
/// fetches return it.
#[derive(Default)]
struct ServerRemote {
    record: Mutex<Option<ProgressRecord>>,
    quiz_submissions: Mutex<Vec<QuizResult>>,
}

#[async_trait]
impl ProgressRemote for ServerRemote {
    async fn fetch_progress(
        &self,
        _course_id: &CourseId,
    ) -> Result<Option<ProgressRecord>, ApiError> {
        Ok(self.record.lock().unwrap().clone())
    }

    async fn push_progress(
        &self,
        _course_id: &CourseId,
        record: &ProgressRecord,
        _total_videos: usize,
    ) -> Result<(), ApiError> {
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    async fn submit_quiz_result(
        &self,
        _course_id: &CourseId,
        result: &QuizResult,
    ) -> Result<(), ApiError> {
        self.quiz_submissions.lock().unwrap().push(result.clone());
        Ok(())
    }
}

fn course_videos() -> BTreeSet<VideoId> {
    ["v1", "v2", "v3"].into_iter().map(VideoId::new).collect()
}

fn final_quiz() -> QuizDefinition {
    QuizDefinition {
        title: "Quiz final".into(),
        questions: vec![
            Question {
                id: QuestionId::new("q1"),
                prompt: "Vrai ou faux ?".into(),
                kind: QuestionKind::TrueFalse { correct: true },
            },
            Question {
                id: QuestionId::new("q2"),
                prompt: "Choisissez".into(),
                kind: QuestionKind::SingleChoice {
                    correct: "b".into(),
                },
            },
        ],
    }
}

#[tokio::test]
async fn full_course_flow_unlocks_quiz_then_certificate() {
    let remote = Arc::new(ServerRemote::default());
    let services = AppServices::in_memory(remote.clone() as Arc<dyn ProgressRemote>, fixed_clock());
    let course = CourseId::new("fr-b2");
    let total = 3;

    // Fresh course: nothing unlocked.
    let record = services.sync().initial_load(&course, &course_videos()).await;
    assert!(record.completed().is_empty());
    let state = services.unlock().compute(&course, total).await;
    assert!(!state.quiz_unlocked);

    // Watch two videos to completion: quiz still locked.
    services
        .sync()
        .record_tick(&course, VideoId::new("v1"), 95.0, total)
        .await;
    services
        .sync()
        .record_tick(&course, VideoId::new("v2"), 91.0, total)
        .await;
    assert!(!services.unlock().compute(&course, total).await.quiz_unlocked);

    // Third video finishes playback: quiz unlocks.
    services
        .sync()
        .finish_video(&course, VideoId::new("v3"), total)
        .await;
    assert!(services.unlock().compute(&course, total).await.quiz_unlocked);

    // Completions were pushed to the server as they happened.
    let server_record = remote.record.lock().unwrap().clone().unwrap();
    assert_eq!(server_record.completed_count(), 3);

    // Pass the quiz: certificate unlocks and the result reaches the API.
    let mut rx = services.hub().subscribe();
    let answers = BTreeMap::from([
        (QuestionId::new("q1"), Answer::single("vrai")),
        (QuestionId::new("q2"), Answer::single("b")),
    ]);
    let result = services
        .quiz()
        .submit(&course, &final_quiz(), &answers)
        .await
        .unwrap();
    assert_eq!(result.score(), 100);
    assert!(services
        .unlock()
        .compute(&course, total)
        .await
        .certificate_unlocked);
    assert_eq!(remote.quiz_submissions.lock().unwrap().len(), 1);

    // The mutation was announced for other live views.
    let signal = rx.recv().await.unwrap();
    assert_eq!(signal.kind, SignalKind::QuizStateChanged);

    // Retry drops everything quiz-related.
    services.quiz().retry(&course).await.unwrap();
    assert!(services.quiz().last_result(&course).await.unwrap().is_none());
    assert!(!services
        .unlock()
        .compute(&course, total)
        .await
        .certificate_unlocked);
    // Video progress is untouched by a quiz retry.
    assert!(services.unlock().compute(&course, total).await.quiz_unlocked);
}

#[tokio::test]
async fn failing_score_leaves_certificate_locked() {
    let remote = Arc::new(ServerRemote::default());
    let services = AppServices::in_memory(remote, fixed_clock());
    let course = CourseId::new("fr-b2");

    let answers = BTreeMap::from([
        (QuestionId::new("q1"), Answer::single("faux")),
        (QuestionId::new("q2"), Answer::single("a")),
    ]);
    let result = services
        .quiz()
        .submit(&course, &final_quiz(), &answers)
        .await
        .unwrap();

    assert_eq!(result.score(), 0);
    assert!(!services.unlock().compute(&course, 0).await.certificate_unlocked);
    // The failed attempt is still stored for display.
    assert!(services.quiz().last_result(&course).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn debounced_telemetry_pushes_once_per_quiet_window() {
    let remote = Arc::new(ServerRemote::default());
    let services = AppServices::in_memory(remote.clone() as Arc<dyn ProgressRemote>, fixed_clock());
    let course = CourseId::new("fr-b2");
    let total = 3;

    // A burst of timeupdate events: local cache tracks every tick, the
    // network sees one call after the quiet period.
    for percent in [10.0, 20.0, 30.0, 40.0, 50.0] {
        services
            .sync()
            .record_tick(&course, VideoId::new("v1"), percent, total)
            .await;
        services
            .telemetry()
            .record_tick(TelemetryTick {
                course_id: course.clone(),
                video_id: VideoId::new("v1"),
                percent,
                completed: false,
                total_videos: total,
            })
            .await;
        tokio::time::advance(Duration::from_millis(200)).await;
    }

    assert!(remote.record.lock().unwrap().is_none());
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let server_record = remote.record.lock().unwrap().clone().unwrap();
    assert_eq!(
        server_record.video_progress()[&VideoId::new("v1")],
        50.0
    );
}

#[tokio::test]
async fn second_session_restores_progress_from_the_server() {
    let remote = Arc::new(ServerRemote::default());
    let course = CourseId::new("fr-b2");

    // First session watches a video and pushes it.
    let first = AppServices::in_memory(remote.clone() as Arc<dyn ProgressRemote>, fixed_clock());
    first
        .sync()
        .record_tick(&course, VideoId::new("v1"), 95.0, 3)
        .await;

    // Second session starts with empty local storage; the server record
    // is adopted.
    let second = AppServices::in_memory(remote.clone() as Arc<dyn ProgressRemote>, fixed_clock());
    let record = second.sync().initial_load(&course, &course_videos()).await;
    assert!(record.is_completed(&VideoId::new("v1")));
}
