use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        course_dto::{ChapterOutline, ChapterViewResponse, CompleteChapterResponse},
        quiz_dto::{PublicQuizResponse, SubmitQuizRequest, SubmitQuizResponse},
    },
    error::{Error, Result},
    middleware::auth::AuthUser,
    models::{
        chapter::Chapter,
        course::Course,
        progress::ProgressRecord,
        quiz::QuizType,
    },
    services::{
        access_service::{can_browse, can_open_chapter, can_view_content, course_access},
        course_service::CourseService,
        profile_service::ProfileService,
        progress_service::ProgressService,
        quiz_service::{QuizService, QuizSession},
    },
    store::DataStore,
    AppState,
};

/// Loads the chapter and its course, failing with a redirect when the caller
/// may not open it.
async fn authorize_chapter(
    store: &Arc<dyn DataStore>,
    user: &AuthUser,
    course_id: Option<Uuid>,
    chapter_id: Uuid,
) -> Result<(Course, Chapter)> {
    let courses = CourseService::new(store.clone());
    let chapter = match course_id {
        Some(course_id) => courses.get_chapter(course_id, chapter_id).await?,
        None => courses.get_chapter_by_id(chapter_id).await?,
    };
    let course = courses.get_course(chapter.course_id).await?;
    let profile = ProfileService::new(store.clone()).get_profile(user.id).await?;

    if !can_browse(&profile, &course) {
        return Err(Error::forbidden(
            "This course is not offered to your university",
            "/courses",
        ));
    }
    if !can_open_chapter(course_access(&profile, &course), &chapter) {
        return Err(Error::forbidden(
            "Enroll in this course to open its chapters",
            format!("/courses/{}", course.id),
        ));
    }
    Ok((course, chapter))
}

#[axum::debug_handler]
pub async fn view_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, chapter_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let store = state.store.scoped(&user.access_token);
    let (_course, chapter) = authorize_chapter(&store, &user, Some(course_id), chapter_id).await?;

    let progress = ProgressService::new(store.clone());
    progress.start_chapter(user.id, chapter.id).await?;
    let record = progress.get_record(user.id, chapter.id).await?;
    let completed = record.as_ref().map(|r| r.completed).unwrap_or(false);

    let response = if can_view_content(&chapter, record.as_ref()) {
        ChapterViewResponse {
            chapter: ChapterOutline::from(&chapter),
            content: chapter.content,
            video_url: chapter.video_url,
            attachments: chapter.attachments,
            locked_by_quiz: None,
            completed,
        }
    } else {
        let quiz = match QuizService::new(store).get_quiz(chapter.id, QuizType::Start).await {
            Ok(quiz) => Some(quiz.id),
            Err(Error::NotFound(_)) => {
                tracing::warn!(chapter_id = %chapter.id, "Chapter requires a start quiz but none exists");
                None
            }
            Err(e) => return Err(e),
        };
        ChapterViewResponse {
            chapter: ChapterOutline::from(&chapter),
            content: None,
            video_url: None,
            attachments: Vec::new(),
            locked_by_quiz: quiz,
            completed,
        }
    };
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn complete_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((course_id, chapter_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let store = state.store.scoped(&user.access_token);
    let (course, chapter) = authorize_chapter(&store, &user, Some(course_id), chapter_id).await?;

    let progress = ProgressService::new(store.clone());
    let record = progress.get_record(user.id, chapter.id).await?;
    if !can_view_content(&chapter, record.as_ref()) {
        return Err(Error::forbidden(
            "Pass the chapter's start quiz first",
            format!("/courses/{}/chapters/{}", course.id, chapter.id),
        ));
    }

    progress.complete_chapter(user.id, chapter.id).await?;
    let chapters = CourseService::new(store).list_chapters(course.id).await?;
    let course_progress = progress.course_progress(user.id, course.id, &chapters).await?;

    Ok(Json(CompleteChapterResponse {
        chapter_id: chapter.id,
        completed: true,
        course_progress: course_progress.summary,
    }))
}

#[axum::debug_handler]
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((chapter_id, quiz_type)): Path<(Uuid, QuizType)>,
) -> Result<impl IntoResponse> {
    let store = state.store.scoped(&user.access_token);
    let (_course, chapter) = authorize_chapter(&store, &user, None, chapter_id).await?;

    let quizzes = QuizService::new(store);
    let quiz = quizzes.get_quiz(chapter.id, quiz_type).await?;
    let questions = quizzes.list_questions(quiz.id).await?;
    if questions.is_empty() {
        return Err(Error::NotFound("Quiz has no questions yet".to_string()));
    }
    Ok(Json(PublicQuizResponse::new(quiz, &questions)))
}

#[axum::debug_handler]
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((chapter_id, quiz_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;
    let store = state.store.scoped(&user.access_token);
    let (_course, chapter) = authorize_chapter(&store, &user, None, chapter_id).await?;

    let quizzes = QuizService::new(store.clone());
    let quiz = quizzes.get_quiz_by_id(chapter.id, quiz_id).await?;
    let record = ProgressService::new(store)
        .get_record(user.id, chapter.id)
        .await?;
    if quiz.quiz_type == QuizType::End && !can_view_content(&chapter, record.as_ref()) {
        return Err(Error::forbidden(
            "Pass the chapter's start quiz first",
            format!("/courses/{}/chapters/{}", chapter.course_id, chapter.id),
        ));
    }

    let questions = quizzes.list_questions(quiz.id).await?;
    let mut answers: HashMap<Uuid, String> = HashMap::with_capacity(req.answers.len());
    for item in req.answers {
        if !questions.iter().any(|q| q.id == item.question_id) {
            return Err(Error::BadRequest(format!(
                "Question {} does not belong to this quiz",
                item.question_id
            )));
        }
        answers.insert(item.question_id, item.answer);
    }

    let result = QuizSession::new(quiz, questions)?.run(&answers)?;
    let attempt = quizzes.record_attempt(user.id, chapter.id, &result).await?;

    let mut record = record.unwrap_or_else(|| ProgressRecord::new(user.id, chapter.id));
    record.quiz_attempts.insert(result.quiz_id, attempt);
    let content_unlocked = can_view_content(&chapter, Some(&record));

    tracing::info!(
        user_id = %user.id,
        chapter_id = %chapter.id,
        score = result.score,
        passed = result.passed,
        "Quiz submitted"
    );
    Ok(Json(SubmitQuizResponse {
        result,
        content_unlocked,
    }))
}
