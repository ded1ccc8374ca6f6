// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{ScoreStore, StoreError};
use crate::{
    models::{
        attempt::{AttemptRecord, RecordedAttempt},
        leaderboard::{self, LeaderboardEntry, LeaderboardRow, SyncReport},
        profile::Profile,
        progress::{ProgressSummary, SubjectProgress, TopicProgress, TopicTaskProgress, percentage},
        task::{Subject, Task, Topic},
    },
    scoring::ScoringPolicy,
};

#[derive(Default)]
struct State {
    users: HashMap<i64, String>,
    subjects: BTreeMap<i64, Subject>,
    topics: BTreeMap<i64, Topic>,
    tasks: BTreeMap<i64, Task>,
    attempts: HashMap<(i64, i64), AttemptRecord>,
    profiles: HashMap<i64, Profile>,
    leaderboard: HashMap<i64, LeaderboardEntry>,
    next_attempt_id: i64,

    // Fault injection.
    pending_conflicts: u32,
    fail_leaderboard_writes: bool,
}

impl State {
    fn tasks_in_order(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by_key(|t| (t.position, t.id));
        tasks
    }
}

/// In-process [`ScoreStore`].
///
/// A single mutex guards the whole state, so every submission is serialized
/// and its writes are committed together at the end of the unit of work.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, id: i64, username: impl Into<String>) {
        self.state.lock().await.users.insert(id, username.into());
    }

    pub async fn add_subject(&self, subject: Subject) {
        self.state.lock().await.subjects.insert(subject.id, subject);
    }

    pub async fn add_topic(&self, topic: Topic) {
        self.state.lock().await.topics.insert(topic.id, topic);
    }

    pub async fn add_task(&self, task: Task) {
        self.state.lock().await.tasks.insert(task.id, task);
    }

    /// Seeds a profile directly, bypassing scoring. The leaderboard is not
    /// touched, which lets callers exercise [`ScoreStore::sync_leaderboard`].
    pub async fn put_profile(&self, profile: Profile) {
        self.state
            .lock()
            .await
            .profiles
            .insert(profile.user_id, profile);
    }

    /// The next `count` submissions fail with [`StoreError::Conflict`].
    pub async fn inject_conflicts(&self, count: u32) {
        self.state.lock().await.pending_conflicts = count;
    }

    /// Makes the leaderboard write of every awarding submission fail.
    pub async fn fail_leaderboard_writes(&self, fail: bool) {
        self.state.lock().await.fail_leaderboard_writes = fail;
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn find_task(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.state.lock().await.tasks.get(&task_id).cloned())
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        Ok(self.state.lock().await.subjects.values().cloned().collect())
    }

    async fn list_topic_tasks(&self, topic_id: i64) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .tasks_in_order()
            .into_iter()
            .filter(|t| t.topic_id == Some(topic_id))
            .cloned()
            .collect())
    }

    async fn record_submission(
        &self,
        user_id: i64,
        task: &Task,
        is_correct: bool,
        policy: &ScoringPolicy,
    ) -> Result<RecordedAttempt, StoreError> {
        let mut state = self.state.lock().await;

        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            return Err(StoreError::Conflict);
        }
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser(user_id));
        }

        let now = Utc::now();
        let key = (user_id, task.id);

        // Work on copies; nothing is written back until every step succeeded.
        let (mut record, next_attempt_id) = match state.attempts.get(&key) {
            Some(existing) => (existing.clone(), state.next_attempt_id),
            None => {
                let id = state.next_attempt_id + 1;
                (AttemptRecord::new(id, user_id, task.id, now), id)
            }
        };

        let points_awarded = record.record_attempt(is_correct, task.difficulty, policy, now);

        let mut credited = None;
        if points_awarded > 0 {
            let mut profile = state
                .profiles
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| Profile::new(user_id, now));
            profile.credit(points_awarded, now);

            if state.fail_leaderboard_writes {
                return Err(StoreError::Unavailable(
                    "leaderboard write failed".to_string(),
                ));
            }
            let entry =
                LeaderboardEntry::sync_from(state.leaderboard.get(&user_id).cloned(), &profile, now);
            credited = Some((profile, entry));
        }

        state.next_attempt_id = next_attempt_id;
        state.attempts.insert(key, record.clone());
        let xp = credited.map(|(profile, entry)| {
            let xp = profile.xp;
            state.profiles.insert(user_id, profile);
            state.leaderboard.insert(user_id, entry);
            xp
        });

        Ok(RecordedAttempt {
            record,
            points_awarded,
            xp,
        })
    }

    async fn attempt(
        &self,
        user_id: i64,
        task_id: i64,
    ) -> Result<Option<AttemptRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .attempts
            .get(&(user_id, task_id))
            .cloned())
    }

    async fn profile(&self, user_id: i64) -> Result<Option<Profile>, StoreError> {
        Ok(self.state.lock().await.profiles.get(&user_id).cloned())
    }

    async fn leaderboard_entry(
        &self,
        user_id: i64,
    ) -> Result<Option<LeaderboardEntry>, StoreError> {
        Ok(self.state.lock().await.leaderboard.get(&user_id).cloned())
    }

    async fn rank_of(&self, user_id: i64) -> Result<Option<i64>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.leaderboard.get(&user_id).map(|entry| {
            leaderboard::rank_for(entry.points, state.leaderboard.values().map(|e| e.points))
        }))
    }

    async fn top(&self, limit: i64) -> Result<Vec<LeaderboardRow>, StoreError> {
        let state = self.state.lock().await;
        let mut rows: Vec<LeaderboardRow> = state
            .leaderboard
            .values()
            .map(|entry| LeaderboardRow {
                user_id: entry.user_id,
                username: state.users.get(&entry.user_id).cloned().unwrap_or_default(),
                points: entry.points,
                updated_at: entry.updated_at,
            })
            .collect();
        leaderboard::sort_rows(&mut rows);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn sync_leaderboard(&self) -> Result<SyncReport, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut report = SyncReport::default();

        let profiles: Vec<Profile> = state.profiles.values().cloned().collect();
        for profile in profiles {
            match state.leaderboard.get(&profile.user_id).cloned() {
                None => {
                    let entry = LeaderboardEntry::sync_from(None, &profile, now);
                    state.leaderboard.insert(profile.user_id, entry);
                    report.created += 1;
                }
                Some(entry) if entry.points != profile.xp => {
                    let entry = LeaderboardEntry::sync_from(Some(entry), &profile, now);
                    state.leaderboard.insert(profile.user_id, entry);
                    report.updated += 1;
                }
                Some(_) => {}
            }
        }

        Ok(report)
    }

    async fn progress(
        &self,
        user_id: i64,
        subject_id: Option<i64>,
    ) -> Result<ProgressSummary, StoreError> {
        let state = self.state.lock().await;
        let records = state.attempts.values().filter(|r| {
            r.user_id == user_id
                && subject_id.is_none_or(|sid| {
                    state
                        .tasks
                        .get(&r.task_id)
                        .is_some_and(|t| t.subject_id == sid)
                })
        });

        let (total, solved) = records.fold((0, 0), |(total, solved), r| {
            (total + 1, solved + i64::from(r.is_solved))
        });
        Ok(ProgressSummary::new(total, solved))
    }

    async fn subject_progress(&self, user_id: i64) -> Result<Vec<SubjectProgress>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .subjects
            .values()
            .map(|subject| {
                let tasks = state.tasks.values().filter(|t| t.subject_id == subject.id);
                let (total, solved) = tasks.fold((0, 0), |(total, solved), t| {
                    let is_solved = state
                        .attempts
                        .get(&(user_id, t.id))
                        .is_some_and(|r| r.is_solved);
                    (total + 1, solved + i64::from(is_solved))
                });
                SubjectProgress {
                    subject_id: subject.id,
                    subject_title: subject.title.clone(),
                    subject_icon: subject.icon.clone(),
                    subject_color: subject.color.clone(),
                    total_tasks: total,
                    completed_tasks: solved,
                    progress_percentage: percentage(solved, total),
                }
            })
            .collect())
    }

    async fn topic_progress(
        &self,
        user_id: i64,
        topic_id: i64,
    ) -> Result<Option<TopicProgress>, StoreError> {
        let state = self.state.lock().await;
        let Some(topic) = state.topics.get(&topic_id) else {
            return Ok(None);
        };

        let tasks = state
            .tasks_in_order()
            .into_iter()
            .filter(|t| t.topic_id == Some(topic_id))
            .map(|t| {
                let record = state.attempts.get(&(user_id, t.id));
                TopicTaskProgress {
                    task_id: t.id,
                    question: t.question.clone(),
                    position: t.position,
                    is_solved: record.is_some_and(|r| r.is_solved),
                    attempts: record.map_or(0, |r| r.attempts),
                }
            })
            .collect();

        Ok(Some(TopicProgress::new(topic.id, topic.title.clone(), tasks)))
    }
}
