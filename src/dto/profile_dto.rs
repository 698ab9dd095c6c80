use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::{Profile, Role};
use crate::models::university::University;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    pub university_id: Option<Uuid>,
    #[validate(length(max = 120))]
    pub major: Option<String>,
    #[validate(length(max = 32))]
    pub academic_year: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

impl UpdateProfilePayload {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.university_id.is_none()
            && self.major.is_none()
            && self.academic_year.is_none()
            && self.bio.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub university: Option<University>,
    pub purchased_courses: Vec<Uuid>,
    pub major: Option<String>,
    pub academic_year: Option<String>,
    pub bio: Option<String>,
}

impl ProfileResponse {
    pub fn new(profile: Profile, university: Option<University>) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name,
            email: profile.email,
            role: profile.role,
            university,
            purchased_courses: profile.purchased_courses,
            major: profile.major,
            academic_year: profile.academic_year,
            bio: profile.bio,
        }
    }
}
