use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::chapter::{Attachment, Chapter};
use crate::models::course::{Course, CourseType};
use crate::services::access_service::CourseAccess;
use crate::services::progress_service::{CourseProgress, ProgressSummary};

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseCard {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub is_free: bool,
    pub course_type: CourseType,
    pub category: Option<String>,
    pub thumbnail_url: Option<String>,
    pub enrolled: bool,
}

impl CourseCard {
    pub fn new(course: Course, enrolled: bool) -> Self {
        let is_free = course.is_free();
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            currency: course.currency,
            is_free,
            course_type: course.course_type,
            category: course.category,
            thumbnail_url: course.thumbnail_url,
            enrolled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogResponse {
    pub courses: Vec<CourseCard>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterOutline {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
    pub is_preview: bool,
    pub has_start_quiz: bool,
    pub has_end_quiz: bool,
}

impl From<&Chapter> for ChapterOutline {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id,
            title: chapter.title.clone(),
            description: chapter.description.clone(),
            order_index: chapter.order_index,
            is_preview: chapter.is_preview,
            has_start_quiz: chapter.has_start_quiz,
            has_end_quiz: chapter.has_end_quiz,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetailResponse {
    pub course: CourseCard,
    pub access: CourseAccess,
    pub chapters: Vec<ChapterOutline>,
    pub progress: Option<CourseProgress>,
}

/// Chapter page. `content`, `video_url` and `attachments` are withheld while
/// the start quiz is unpassed; `locked_by_quiz` then names that quiz.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterViewResponse {
    pub chapter: ChapterOutline,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub attachments: Vec<Attachment>,
    pub locked_by_quiz: Option<Uuid>,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteChapterResponse {
    pub chapter_id: Uuid,
    pub completed: bool,
    pub course_progress: ProgressSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCourse {
    pub course: CourseCard,
    pub progress: ProgressSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub courses: Vec<DashboardCourse>,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
}
