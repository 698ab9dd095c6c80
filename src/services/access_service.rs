use serde::Serialize;

use crate::models::chapter::Chapter;
use crate::models::course::{Course, CourseType};
use crate::models::profile::{Profile, Role};
use crate::models::progress::ProgressRecord;
use crate::models::quiz::QuizType;

/// Why a caller may open a course's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseAccess {
    Purchased,
    University,
    Admin,
    Denied,
}

impl CourseAccess {
    pub fn is_granted(self) -> bool {
        self != CourseAccess::Denied
    }
}

pub fn course_access(profile: &Profile, course: &Course) -> CourseAccess {
    if profile.role == Role::Admin {
        return CourseAccess::Admin;
    }
    if profile.has_purchased(course.id) {
        return CourseAccess::Purchased;
    }
    if course.course_type == CourseType::University
        && course.university_id.is_some()
        && course.university_id == profile.university_id
    {
        return CourseAccess::University;
    }
    CourseAccess::Denied
}

/// Whether the course shows up in the caller's catalog and its page may be
/// opened. University courses are only listed for their own university.
pub fn can_browse(profile: &Profile, course: &Course) -> bool {
    match course.course_type {
        CourseType::Public => true,
        CourseType::University => {
            profile.role == Role::Admin
                || (course.university_id.is_some() && course.university_id == profile.university_id)
        }
    }
}

/// Preview chapters can be opened by anyone who can see the course page.
pub fn can_open_chapter(access: CourseAccess, chapter: &Chapter) -> bool {
    access.is_granted() || chapter.is_preview
}

/// Video and text of a chapter with a start quiz stay hidden until a start
/// attempt has been recorded as passed.
pub fn can_view_content(chapter: &Chapter, progress: Option<&ProgressRecord>) -> bool {
    if !chapter.has_start_quiz {
        return true;
    }
    progress
        .map(|record| {
            record
                .attempts()
                .any(|a| a.quiz_type == QuizType::Start && a.passed)
        })
        .unwrap_or(false)
}
