use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::chapter::Chapter;
use crate::models::course::Course;
use crate::models::profile::Profile;
use crate::services::access_service::can_browse;
use crate::store::{self, tables, DataStore, Order, Query};

/// Chapter columns for outlines and progress; body, video and attachments
/// are only read when a single chapter is opened.
pub const CHAPTER_OUTLINE_COLUMNS: &[&str] = &[
    "id",
    "course_id",
    "title",
    "description",
    "order_index",
    "is_preview",
    "has_start_quiz",
    "has_end_quiz",
];

#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub category: Option<String>,
}

#[derive(Clone)]
pub struct CourseService {
    store: Arc<dyn DataStore>,
}

impl CourseService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Active public courses plus the university courses of the caller's
    /// university, sorted by title.
    pub async fn list_courses(&self, profile: &Profile, filter: &CatalogFilter) -> Result<Vec<Course>> {
        let mut query = Query::table(tables::COURSES)
            .eq("is_active", true)
            .order_by("title", Order::Asc);
        if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
            query = query.eq("category", category.trim());
        }

        let courses: Vec<Course> = store::fetch_all(self.store.as_ref(), &query).await?;
        Ok(courses
            .into_iter()
            .filter(|c| can_browse(profile, c))
            .collect())
    }

    pub async fn list_courses_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::table(tables::COURSES)
            .is_in("id", ids.iter())
            .order_by("title", Order::Asc);
        store::fetch_all(self.store.as_ref(), &query).await
    }

    pub async fn list_university_courses(&self, university_id: Uuid) -> Result<Vec<Course>> {
        let query = Query::table(tables::COURSES)
            .eq("course_type", "university")
            .eq("university_id", university_id)
            .eq("is_active", true)
            .order_by("title", Order::Asc);
        store::fetch_all(self.store.as_ref(), &query).await
    }

    pub async fn get_course(&self, course_id: Uuid) -> Result<Course> {
        let query = Query::table(tables::COURSES).eq("id", course_id);
        let course: Course = store::fetch_one(self.store.as_ref(), &query, "Course").await?;
        if !course.is_active {
            return Err(Error::NotFound("Course not found".to_string()));
        }
        Ok(course)
    }

    pub async fn list_chapters(&self, course_id: Uuid) -> Result<Vec<Chapter>> {
        let query = Query::table(tables::CHAPTERS)
            .select(CHAPTER_OUTLINE_COLUMNS)
            .eq("course_id", course_id)
            .order_by("order_index", Order::Asc);
        store::fetch_all(self.store.as_ref(), &query).await
    }

    pub async fn get_chapter(&self, course_id: Uuid, chapter_id: Uuid) -> Result<Chapter> {
        let query = Query::table(tables::CHAPTERS)
            .eq("id", chapter_id)
            .eq("course_id", course_id);
        store::fetch_one(self.store.as_ref(), &query, "Chapter").await
    }

    pub async fn get_chapter_by_id(&self, chapter_id: Uuid) -> Result<Chapter> {
        let query = Query::table(tables::CHAPTERS).eq("id", chapter_id);
        store::fetch_one(self.store.as_ref(), &query, "Chapter").await
    }
}
