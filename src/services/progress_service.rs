use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::models::chapter::Chapter;
use crate::models::progress::{ChapterStatus, ProgressRecord};
use crate::store::{self, tables, DataStore, Query, Resolution};

pub const PROGRESS_CONFLICT_KEY: &[&str] = &["user_id", "chapter_id"];

/// Columns needed to tell chapter status; attempts are left out.
pub const PROGRESS_STATUS_COLUMNS: &[&str] =
    &["user_id", "chapter_id", "started_at", "completed", "completed_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed_count: usize,
    pub total_count: usize,
    pub percentage: u32,
}

/// Completion of a course: chapters of `chapters` whose progress record is
/// marked completed, rounded to a whole percent. Records for other chapters
/// are ignored and each chapter counts once.
pub fn summarize(chapters: &[Chapter], progress: &[ProgressRecord]) -> ProgressSummary {
    let total_count = chapters.len();
    let completed_count = chapters
        .iter()
        .filter(|chapter| {
            progress
                .iter()
                .any(|p| p.chapter_id == chapter.id && p.completed)
        })
        .count();

    ProgressSummary {
        completed_count,
        total_count,
        percentage: rounded_percent(completed_count, total_count),
    }
}

/// `round(100 * part / whole)` with halves rounded up, `0` for an empty whole.
pub fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u32
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterProgress {
    pub chapter_id: Uuid,
    pub status: ChapterStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub summary: ProgressSummary,
    pub chapters: Vec<ChapterProgress>,
}

#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn DataStore>,
}

impl ProgressService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn get_record(&self, user_id: Uuid, chapter_id: Uuid) -> Result<Option<ProgressRecord>> {
        let query = Query::table(tables::STUDENT_PROGRESS)
            .eq("user_id", user_id)
            .eq("chapter_id", chapter_id);
        store::fetch_optional(self.store.as_ref(), &query).await
    }

    pub async fn records_for_chapters(
        &self,
        user_id: Uuid,
        chapter_ids: &[Uuid],
    ) -> Result<Vec<ProgressRecord>> {
        if chapter_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::table(tables::STUDENT_PROGRESS)
            .select(PROGRESS_STATUS_COLUMNS)
            .eq("user_id", user_id)
            .is_in("chapter_id", chapter_ids.iter());
        store::fetch_all(self.store.as_ref(), &query).await
    }

    /// Records the first view of a chapter. An existing record is left as is.
    pub async fn start_chapter(&self, user_id: Uuid, chapter_id: Uuid) -> Result<()> {
        let row = json!({
            "user_id": user_id,
            "chapter_id": chapter_id,
            "started_at": Utc::now(),
            "completed": false,
            "quiz_attempts": {},
        });
        self.store
            .upsert(
                tables::STUDENT_PROGRESS,
                row,
                PROGRESS_CONFLICT_KEY,
                Resolution::Ignore,
            )
            .await?;
        Ok(())
    }

    pub async fn complete_chapter(&self, user_id: Uuid, chapter_id: Uuid) -> Result<()> {
        let existing = self.get_record(user_id, chapter_id).await?;
        let now = Utc::now();
        let started_at = existing.and_then(|r| r.started_at).unwrap_or(now);
        let row = json!({
            "user_id": user_id,
            "chapter_id": chapter_id,
            "started_at": started_at,
            "completed": true,
            "completed_at": now,
        });
        self.store
            .upsert(
                tables::STUDENT_PROGRESS,
                row,
                PROGRESS_CONFLICT_KEY,
                Resolution::Merge,
            )
            .await?;
        tracing::info!(%user_id, %chapter_id, "Chapter completed");
        Ok(())
    }

    pub async fn course_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        chapters: &[Chapter],
    ) -> Result<CourseProgress> {
        let ids: Vec<Uuid> = chapters.iter().map(|c| c.id).collect();
        let records = self.records_for_chapters(user_id, &ids).await?;
        Ok(build_course_progress(course_id, chapters, &records))
    }
}

pub fn build_course_progress(
    course_id: Uuid,
    chapters: &[Chapter],
    records: &[ProgressRecord],
) -> CourseProgress {
    let by_chapter: HashMap<Uuid, &ProgressRecord> =
        records.iter().map(|r| (r.chapter_id, r)).collect();
    let chapters_progress = chapters
        .iter()
        .map(|chapter| ChapterProgress {
            chapter_id: chapter.id,
            status: by_chapter
                .get(&chapter.id)
                .map(|r| r.status())
                .unwrap_or(ChapterStatus::NotStarted),
        })
        .collect();

    CourseProgress {
        course_id,
        summary: summarize(chapters, records),
        chapters: chapters_progress,
    }
}
