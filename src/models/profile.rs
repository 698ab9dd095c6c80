use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub university_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub purchased_courses: Vec<Uuid>,
    pub major: Option<String>,
    pub academic_year: Option<String>,
    pub bio: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Uuid>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Uuid>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Profile {
    pub fn has_purchased(&self, course_id: Uuid) -> bool {
        self.purchased_courses.contains(&course_id)
    }
}
