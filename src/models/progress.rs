use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::quiz::QuizType;

/// Outcome of one quiz submission, stored under the quiz id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub score: i32,
    pub passed: bool,
    /// Question id -> submitted answer.
    #[serde(default)]
    pub answers: BTreeMap<Uuid, String>,
    pub completed_at: DateTime<Utc>,
    pub quiz_type: QuizType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: Uuid,
    pub chapter_id: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub quiz_attempts: BTreeMap<Uuid, QuizAttempt>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<Uuid, QuizAttempt>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<BTreeMap<Uuid, QuizAttempt>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressRecord {
    pub fn new(user_id: Uuid, chapter_id: Uuid) -> Self {
        Self {
            user_id,
            chapter_id,
            started_at: None,
            completed: false,
            completed_at: None,
            quiz_attempts: BTreeMap::new(),
        }
    }

    pub fn status(&self) -> ChapterStatus {
        if self.completed {
            ChapterStatus::Completed
        } else {
            ChapterStatus::InProgress
        }
    }

    pub fn attempts(&self) -> impl Iterator<Item = &QuizAttempt> {
        self.quiz_attempts.values()
    }
}
