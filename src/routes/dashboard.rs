use std::collections::BTreeSet;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::course_dto::{CourseCard, DashboardCourse, DashboardResponse},
    error::Result,
    middleware::auth::AuthUser,
    services::{
        course_service::CourseService, profile_service::ProfileService,
        progress_service::ProgressService,
    },
    AppState,
};

/// Every course the caller can study (purchased plus their university's
/// courses) with its completion percentage.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Enrolled courses with progress", body = Json<DashboardResponse>),
        (status = 401, description = "Missing or invalid access token")
    )
)]
#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let store = state.store.scoped(&user.access_token);
    let profile = ProfileService::new(store.clone()).get_profile(user.id).await?;
    let courses = CourseService::new(store.clone());

    let mut ids: BTreeSet<Uuid> = profile.purchased_courses.iter().copied().collect();
    if let Some(university_id) = profile.university_id {
        ids.extend(
            courses
                .list_university_courses(university_id)
                .await?
                .into_iter()
                .map(|c| c.id),
        );
    }
    let ids: Vec<Uuid> = ids.into_iter().collect();

    let progress = ProgressService::new(store);
    let mut entries = Vec::new();
    for course in courses.list_courses_by_ids(&ids).await? {
        if !course.is_active {
            continue;
        }
        let chapters = courses.list_chapters(course.id).await?;
        let summary = progress
            .course_progress(user.id, course.id, &chapters)
            .await?
            .summary;
        entries.push(DashboardCourse {
            course: CourseCard::new(course, true),
            progress: summary,
        });
    }

    let completed_courses = entries
        .iter()
        .filter(|e| e.progress.total_count > 0 && e.progress.percentage == 100)
        .count();
    Ok(Json(DashboardResponse {
        in_progress_courses: entries.len() - completed_courses,
        completed_courses,
        courses: entries,
    }))
}
