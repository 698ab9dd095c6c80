use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::course_dto::{CatalogQuery, CatalogResponse, CourseCard, CourseDetailResponse, ChapterOutline},
    error::{Error, Result},
    middleware::auth::AuthUser,
    services::{
        access_service::{can_browse, course_access},
        course_service::{CatalogFilter, CourseService},
        entitlement_service::EntitlementService,
        profile_service::ProfileService,
        progress_service::ProgressService,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/courses",
    params(
        ("category" = Option<String>, Query, description = "Only courses in this category")
    ),
    responses(
        (status = 200, description = "Courses visible to the caller", body = Json<CatalogResponse>),
        (status = 401, description = "Missing or invalid access token")
    )
)]
#[axum::debug_handler]
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let store = state.store.scoped(&user.access_token);
    let profile = ProfileService::new(store.clone()).get_profile(user.id).await?;
    let filter = CatalogFilter {
        category: query.category,
    };
    let courses = CourseService::new(store).list_courses(&profile, &filter).await?;

    let cards: Vec<CourseCard> = courses
        .into_iter()
        .map(|course| {
            let enrolled = course_access(&profile, &course).is_granted();
            CourseCard::new(course, enrolled)
        })
        .collect();
    Ok(Json(CatalogResponse {
        total: cards.len(),
        courses: cards,
    }))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    params(
        ("course_id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course page", body = Json<CourseDetailResponse>),
        (status = 403, description = "Course belongs to another university"),
        (status = 404, description = "Course not found")
    )
)]
#[axum::debug_handler]
pub async fn get_course(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let store = state.store.scoped(&user.access_token);
    let profile = ProfileService::new(store.clone()).get_profile(user.id).await?;
    let courses = CourseService::new(store.clone());
    let course = courses.get_course(course_id).await?;
    if !can_browse(&profile, &course) {
        return Err(Error::forbidden(
            "This course is not offered to your university",
            "/courses",
        ));
    }

    let access = course_access(&profile, &course);
    let chapters = courses.list_chapters(course_id).await?;
    let progress = if access.is_granted() {
        Some(
            ProgressService::new(store)
                .course_progress(user.id, course.id, &chapters)
                .await?,
        )
    } else {
        None
    };

    Ok(Json(CourseDetailResponse {
        course: CourseCard::new(course, access.is_granted()),
        access,
        chapters: chapters.iter().map(ChapterOutline::from).collect(),
        progress,
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/enroll",
    params(
        ("course_id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Enrolled (or already enrolled)"),
        (status = 404, description = "Course not found"),
        (status = 501, description = "Priced courses cannot be purchased yet")
    )
)]
#[axum::debug_handler]
pub async fn enroll(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let store = state.store.scoped(&user.access_token);
    let profile = ProfileService::new(store.clone()).get_profile(user.id).await?;
    let course = CourseService::new(store.clone()).get_course(course_id).await?;
    if !can_browse(&profile, &course) {
        return Err(Error::forbidden(
            "This course is not offered to your university",
            "/courses",
        ));
    }

    let outcome = EntitlementService::new(store).enroll(&profile, &course).await?;
    Ok(Json(outcome))
}
