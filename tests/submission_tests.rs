// tests/submission_tests.rs

mod common;

use std::sync::Arc;

use common::{seeded_store, service, task};
use exam_scoring::{
    config::SubmissionSettings,
    error::ScoringError,
    services::SubmissionService,
    store::{MemoryStore, ScoreStore},
};

#[tokio::test]
async fn first_try_correct_awards_full_points() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    let result = svc.submit_answer(Some(1), 1, "4").await.unwrap();

    assert!(result.is_correct);
    assert!(result.is_solved);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.points_awarded, 10);
    assert_eq!(result.correct_answer.as_deref(), Some("4"));

    let record = store.attempt(1, 1).await.unwrap().unwrap();
    assert_eq!(record.points_earned, 10);
    assert_eq!(store.profile(1).await.unwrap().unwrap().xp, 10);
    assert_eq!(store.leaderboard_entry(1).await.unwrap().unwrap().points, 10);
}

#[tokio::test]
async fn second_try_correct_awards_seventy_percent() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    let wrong = svc.submit_answer(Some(1), 1, "5").await.unwrap();
    assert!(!wrong.is_correct);
    assert!(!wrong.is_solved);
    assert_eq!(wrong.attempts, 1);
    assert_eq!(wrong.points_awarded, 0);
    assert_eq!(wrong.correct_answer, None);
    assert!(store.profile(1).await.unwrap().is_none());

    let right = svc.submit_answer(Some(1), 1, "4").await.unwrap();
    assert!(right.is_solved);
    assert_eq!(right.attempts, 2);
    assert_eq!(right.points_awarded, 7);
    assert_eq!(store.profile(1).await.unwrap().unwrap().xp, 7);
}

#[tokio::test]
async fn third_try_and_later_award_half() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    for _ in 0..4 {
        svc.submit_answer(Some(1), 3, "A").await.unwrap();
    }
    let result = svc.submit_answer(Some(1), 3, "B").await.unwrap();

    assert_eq!(result.attempts, 5);
    // floor(15 * 0.5)
    assert_eq!(result.points_awarded, 7);
}

#[tokio::test]
async fn resubmitting_a_solved_task_changes_nothing() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    svc.submit_answer(Some(1), 1, "4").await.unwrap();
    let record_before = store.attempt(1, 1).await.unwrap().unwrap();

    let again = svc.submit_answer(Some(1), 1, "4").await.unwrap();
    assert!(again.is_correct);
    assert!(again.is_solved);
    assert_eq!(again.points_awarded, 0);
    assert_eq!(again.attempts, 1);

    let wrong = svc.submit_answer(Some(1), 1, "3").await.unwrap();
    assert!(!wrong.is_correct);
    assert!(wrong.is_solved);
    assert_eq!(wrong.points_awarded, 0);

    assert_eq!(store.attempt(1, 1).await.unwrap().unwrap(), record_before);
    assert_eq!(store.profile(1).await.unwrap().unwrap().xp, 10);
}

#[tokio::test]
async fn answer_revealed_after_three_failures() {
    let store = seeded_store().await;
    let svc = service(store);

    let first = svc.submit_answer(Some(2), 2, "3").await.unwrap();
    let second = svc.submit_answer(Some(2), 2, "3").await.unwrap();
    let third = svc.submit_answer(Some(2), 2, "3").await.unwrap();

    assert_eq!(first.correct_answer, None);
    assert_eq!(second.correct_answer, None);
    assert!(!third.is_correct);
    assert_eq!(third.attempts, 3);
    assert_eq!(third.correct_answer.as_deref(), Some("4"));
}

#[tokio::test]
async fn answers_are_compared_exactly_after_trim() {
    let store = seeded_store().await;
    let svc = service(store);

    let padded = svc.submit_answer(Some(1), 2, "  4 ").await.unwrap();
    assert!(padded.is_correct);

    let spelled = svc.submit_answer(Some(2), 2, "four").await.unwrap();
    assert!(!spelled.is_correct);

    let lowercase = svc.submit_answer(Some(2), 3, "b").await.unwrap();
    assert!(!lowercase.is_correct);
}

#[tokio::test]
async fn rejections_leave_no_trace() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    assert_eq!(
        svc.submit_answer(None, 1, "4").await.unwrap_err(),
        ScoringError::Unauthenticated
    );
    assert!(matches!(
        svc.submit_answer(Some(1), 1, "   ").await.unwrap_err(),
        ScoringError::InvalidAnswer(_)
    ));
    assert!(matches!(
        svc.submit_answer(Some(1), 1, &"4".repeat(101)).await.unwrap_err(),
        ScoringError::InvalidAnswer(_)
    ));
    assert_eq!(
        svc.submit_answer(Some(1), 99, "4").await.unwrap_err(),
        ScoringError::TaskNotFound(99)
    );

    assert!(store.attempt(1, 1).await.unwrap().is_none());
    assert!(store.profile(1).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_user_is_unauthenticated() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    let err = svc.submit_answer(Some(77), 1, "4").await.unwrap_err();
    assert_eq!(err, ScoringError::Unauthenticated);
    assert!(store.attempt(77, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn xp_equals_sum_of_points_earned() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    let script = [(1, "5"), (1, "4"), (2, "4"), (3, "A"), (3, "A"), (3, "B"), (1, "4")];
    for (task_id, answer) in script {
        svc.submit_answer(Some(1), task_id, answer).await.unwrap();
    }

    let mut sum = 0;
    for task_id in 1..=3 {
        sum += i64::from(store.attempt(1, task_id).await.unwrap().unwrap().points_earned);
    }
    // 7 + 5 + 7
    assert_eq!(sum, 19);
    assert_eq!(store.profile(1).await.unwrap().unwrap().xp, sum);
    assert_eq!(store.leaderboard_entry(1).await.unwrap().unwrap().points, sum);
}

#[tokio::test]
async fn attempts_increase_by_one_until_solved() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    for expected in 1..=4 {
        let result = svc.submit_answer(Some(3), 1, "0").await.unwrap();
        assert_eq!(result.attempts, expected);
        assert_eq!(store.attempt(3, 1).await.unwrap().unwrap().attempts, expected);
    }
    svc.submit_answer(Some(3), 1, "4").await.unwrap();
    svc.submit_answer(Some(3), 1, "0").await.unwrap();
    assert_eq!(store.attempt(3, 1).await.unwrap().unwrap().attempts, 5);
}

#[tokio::test]
async fn concurrent_correct_submissions_award_once() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.submit_answer(Some(1), 1, "4").await })
        })
        .collect();

    let mut awarded = Vec::new();
    for handle in handles {
        awarded.push(handle.await.unwrap().unwrap().points_awarded);
    }

    assert_eq!(awarded.iter().filter(|p| **p > 0).count(), 1);
    assert_eq!(awarded.iter().sum::<i32>(), 10);

    let record = store.attempt(1, 1).await.unwrap().unwrap();
    assert_eq!(record.attempts, 1);
    assert!(record.is_solved);
    assert_eq!(store.profile(1).await.unwrap().unwrap().xp, 10);
}

#[tokio::test]
async fn concurrent_solves_of_different_tasks_all_count() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    let handles: Vec<_> = [(1, "4"), (2, "4"), (3, "B")]
        .into_iter()
        .map(|(task_id, answer)| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.submit_answer(Some(2), task_id, answer).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.profile(2).await.unwrap().unwrap().xp, 10 + 5 + 15);
}

#[tokio::test]
async fn transient_conflicts_are_retried() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    store.inject_conflicts(2).await;
    let result = svc.submit_answer(Some(1), 1, "4").await.unwrap();

    assert_eq!(result.points_awarded, 10);
    assert_eq!(store.attempt(1, 1).await.unwrap().unwrap().attempts, 1);
}

#[tokio::test]
async fn persistent_conflict_surfaces_without_effects() {
    let store = seeded_store().await;
    let settings = SubmissionSettings {
        retry_attempts: 2,
        ..SubmissionSettings::default()
    };
    let svc = SubmissionService::new(store.clone(), settings);

    store.inject_conflicts(5).await;
    let err = svc.submit_answer(Some(1), 1, "4").await.unwrap_err();

    assert_eq!(err, ScoringError::ConcurrencyConflict);
    assert!(store.attempt(1, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_leaderboard_write_rolls_back_everything() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    store.fail_leaderboard_writes(true).await;
    let err = svc.submit_answer(Some(1), 1, "4").await.unwrap_err();
    assert!(matches!(err, ScoringError::StorageUnavailable(_)));

    assert!(store.attempt(1, 1).await.unwrap().is_none());
    assert!(store.profile(1).await.unwrap().is_none());
    assert!(store.leaderboard_entry(1).await.unwrap().is_none());

    store.fail_leaderboard_writes(false).await;
    let result = svc.submit_answer(Some(1), 1, "4").await.unwrap();
    assert_eq!(result.attempts, 1);
    assert_eq!(result.points_awarded, 10);
}

#[tokio::test]
async fn leaderboard_ranks_by_strictly_greater_points() {
    let store = Arc::new(MemoryStore::new());
    store.add_user(1, "a").await;
    store.add_user(2, "b").await;
    store.add_user(3, "c").await;
    // difficulty 10 -> 50 points, difficulty 16 -> 80 points
    store.add_task(task(10, 10, "x")).await;
    store.add_task(task(16, 16, "x")).await;
    let svc = service(store.clone());

    svc.submit_answer(Some(1), 10, "x").await.unwrap();
    svc.submit_answer(Some(2), 16, "x").await.unwrap();

    assert_eq!(store.rank_of(1).await.unwrap(), Some(2));
    assert_eq!(store.rank_of(2).await.unwrap(), Some(1));
    assert_eq!(store.rank_of(3).await.unwrap(), None);

    svc.submit_answer(Some(3), 16, "x").await.unwrap();
    assert_eq!(store.rank_of(3).await.unwrap(), Some(1));
    assert_eq!(store.rank_of(2).await.unwrap(), Some(1));
    assert_eq!(store.rank_of(1).await.unwrap(), Some(3));

    let top = store.top(10).await.unwrap();
    let order: Vec<i64> = top.iter().map(|r| r.user_id).collect();
    // Ties go to whoever reached the score first.
    assert_eq!(order, vec![2, 3, 1]);
    assert_eq!(store.top(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sync_rebuilds_projection_from_profiles() {
    use chrono::Utc;
    use exam_scoring::models::profile::Profile;

    let store = seeded_store().await;
    let svc = service(store.clone());
    svc.submit_answer(Some(1), 1, "4").await.unwrap();

    // Profile drifted from the projection, and a profile with no entry.
    let mut drifted = store.profile(1).await.unwrap().unwrap();
    drifted.xp = 42;
    store.put_profile(drifted).await;
    let mut orphan = Profile::new(2, Utc::now());
    orphan.xp = 5;
    store.put_profile(orphan).await;

    let report = store.sync_leaderboard().await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(store.leaderboard_entry(1).await.unwrap().unwrap().points, 42);
    assert_eq!(store.leaderboard_entry(2).await.unwrap().unwrap().points, 5);

    let again = store.sync_leaderboard().await.unwrap();
    assert_eq!((again.created, again.updated), (0, 0));
}

#[tokio::test]
async fn progress_reflects_solved_tasks() {
    let store = seeded_store().await;
    let svc = service(store.clone());

    svc.submit_answer(Some(1), 1, "4").await.unwrap();
    svc.submit_answer(Some(1), 2, "3").await.unwrap();

    let summary = store.progress(1, None).await.unwrap();
    assert_eq!(summary.total_attempts, 2);
    assert_eq!(summary.solved, 1);
    assert_eq!(summary.percentage, 50);

    assert_eq!(store.progress(1, Some(2)).await.unwrap().total_attempts, 0);

    let subjects = store.subject_progress(1).await.unwrap();
    let maths = subjects.iter().find(|s| s.subject_id == 1).unwrap();
    assert_eq!(maths.total_tasks, 3);
    assert_eq!(maths.completed_tasks, 1);
    assert_eq!(maths.progress_percentage, 33);

    let topic = store.topic_progress(1, 1).await.unwrap().unwrap();
    assert_eq!(topic.total_tasks, 3);
    assert_eq!(topic.completed_tasks, 1);
    assert_eq!(topic.tasks[1].attempts, 1);
    assert!(!topic.tasks[1].is_solved);
    assert!(store.topic_progress(1, 9).await.unwrap().is_none());
}
