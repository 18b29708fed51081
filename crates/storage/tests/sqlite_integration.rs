use std::collections::BTreeMap;

use campus_core::model::{
    Answer, CourseId, ProgressRecord, QuestionId, QuestionOutcome, QuizResult, VideoId,
};
use campus_core::time::fixed_now;
use storage::repository::{ProgressRepository, QuizStateRepository};
use storage::sqlite::SqliteRepository;

fn build_result(correct: usize, total: usize) -> QuizResult {
    let breakdown = (0..total)
        .map(|i| QuestionOutcome {
            question_id: QuestionId::new(format!("q{i}")),
            is_correct: i < correct,
            feedback: String::new(),
        })
        .collect();
    let answers = BTreeMap::from([
        (QuestionId::new("q0"), Answer::single("vrai")),
        (QuestionId::new("q1"), Answer::multiple(["a", "b"])),
    ]);
    QuizResult::from_outcomes(answers, breakdown, fixed_now())
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = CourseId::new("fr-b2");
    let mut record = ProgressRecord::empty(course.clone(), fixed_now());
    record.record_tick(VideoId::new("v1"), 45.5, fixed_now());
    record.record_tick(VideoId::new("v2"), 93.0, fixed_now());
    repo.upsert_progress(&record).await.unwrap();

    let fetched = repo.get_progress(&course).await.unwrap().expect("stored");
    assert_eq!(fetched, record);
    assert!(fetched.is_completed(&VideoId::new("v2")));
    assert_eq!(fetched.video_progress()[&VideoId::new("v1")], 45.5);
}

#[tokio::test]
async fn sqlite_upsert_replaces_existing_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_replace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = CourseId::new("c1");
    let mut record = ProgressRecord::empty(course.clone(), fixed_now());
    record.record_tick(VideoId::new("v1"), 10.0, fixed_now());
    repo.upsert_progress(&record).await.unwrap();

    record.record_tick(VideoId::new("v1"), 91.0, fixed_now());
    repo.upsert_progress(&record).await.unwrap();

    let fetched = repo.get_progress(&course).await.unwrap().expect("stored");
    assert_eq!(fetched.completed_count(), 1);
}

#[tokio::test]
async fn sqlite_quiz_state_roundtrip_and_clear() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_quiz?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = CourseId::new("c1");
    assert!(repo.get_result(&course).await.unwrap().is_none());
    assert!(!repo.certificate_unlocked(&course).await.unwrap());

    let result = build_result(3, 4);
    repo.save_result(&course, &result).await.unwrap();
    repo.set_certificate_unlocked(&course, true).await.unwrap();

    let fetched = repo.get_result(&course).await.unwrap().expect("stored");
    assert_eq!(fetched.score(), result.score());
    assert_eq!(fetched.answers(), result.answers());
    assert!(repo.certificate_unlocked(&course).await.unwrap());

    repo.clear_quiz_state(&course).await.unwrap();
    assert!(repo.get_result(&course).await.unwrap().is_none());
    assert!(!repo.certificate_unlocked(&course).await.unwrap());
}

#[tokio::test]
async fn sqlite_certificate_flag_is_independent_of_score() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_flag?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let course = CourseId::new("c1");
    // A failing result can be stored without the flag ever being set.
    repo.save_result(&course, &build_result(1, 4)).await.unwrap();
    assert!(!repo.certificate_unlocked(&course).await.unwrap());
}
