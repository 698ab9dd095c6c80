use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

use crate::dto::profile_dto::UpdateProfilePayload;
use crate::error::{Error, Result};
use crate::models::profile::Profile;
use crate::models::university::University;
use crate::store::{self, tables, DataStore, Order, Query};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DataStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile> {
        let query = Query::table(tables::PROFILES).eq("id", user_id);
        store::fetch_one(self.store.as_ref(), &query, "Profile").await
    }

    pub async fn update_profile(&self, user_id: Uuid, payload: UpdateProfilePayload) -> Result<Profile> {
        payload.validate()?;
        if payload.is_empty() {
            return Err(Error::BadRequest("No profile fields to update".to_string()));
        }
        if payload.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::BadRequest("Full name cannot be blank".to_string()));
        }
        if let Some(university_id) = payload.university_id {
            self.get_university(university_id).await.map_err(|e| match e {
                Error::NotFound(_) => Error::BadRequest(format!("Unknown university {}", university_id)),
                other => other,
            })?;
        }

        let mut patch = Map::new();
        if let Some(full_name) = payload.full_name {
            patch.insert("full_name".into(), JsonValue::String(full_name.trim().to_string()));
        }
        if let Some(university_id) = payload.university_id {
            patch.insert("university_id".into(), JsonValue::String(university_id.to_string()));
        }
        if let Some(major) = payload.major {
            patch.insert("major".into(), JsonValue::String(major));
        }
        if let Some(academic_year) = payload.academic_year {
            patch.insert("academic_year".into(), JsonValue::String(academic_year));
        }
        if let Some(bio) = payload.bio {
            patch.insert("bio".into(), JsonValue::String(bio));
        }

        let query = Query::table(tables::PROFILES).eq("id", user_id);
        let mut rows = self.store.update(&query, JsonValue::Object(patch)).await?;
        let row = rows
            .pop()
            .ok_or_else(|| Error::NotFound("Profile not found".to_string()))?;
        tracing::info!(%user_id, "Profile updated");
        Ok(serde_json::from_value(row)?)
    }

    pub async fn list_universities(&self) -> Result<Vec<University>> {
        let query = Query::table(tables::UNIVERSITIES).order_by("name", Order::Asc);
        store::fetch_all(self.store.as_ref(), &query).await
    }

    pub async fn get_university(&self, university_id: Uuid) -> Result<University> {
        let query = Query::table(tables::UNIVERSITIES).eq("id", university_id);
        store::fetch_one(self.store.as_ref(), &query, "University").await
    }
}
