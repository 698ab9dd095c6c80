use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::course::Course;
use crate::models::profile::Profile;
use crate::store::{tables, DataStore, Query};

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentOutcome {
    pub course_id: Uuid,
    pub enrolled: bool,
    pub already_enrolled: bool,
}

#[derive(Clone)]
pub struct EntitlementService {
    store: Arc<dyn DataStore>,
}

impl EntitlementService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Free courses are added to the profile's purchased list. Priced courses
    /// need a payment provider, which is not wired in yet.
    pub async fn enroll(&self, profile: &Profile, course: &Course) -> Result<EnrollmentOutcome> {
        if !course.is_free() {
            tracing::info!(course_id = %course.id, price = %course.price, "Purchase requested for priced course");
            return Err(Error::PaymentNotAvailable);
        }

        if profile.has_purchased(course.id) {
            return Ok(EnrollmentOutcome {
                course_id: course.id,
                enrolled: true,
                already_enrolled: true,
            });
        }

        let mut purchased = profile.purchased_courses.clone();
        purchased.push(course.id);

        let query = Query::table(tables::PROFILES).eq("id", profile.id);
        let updated = self
            .store
            .update(&query, json!({ "purchased_courses": purchased }))
            .await?;
        if updated.is_empty() {
            return Err(Error::NotFound("Profile not found".to_string()));
        }

        tracing::info!(user_id = %profile.id, course_id = %course.id, "Enrolled in free course");
        Ok(EnrollmentOutcome {
            course_id: course.id,
            enrolled: true,
            already_enrolled: false,
        })
    }
}
