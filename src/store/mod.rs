//! Generic query/update access to the hosted data store.
//!
//! Every read and write the service performs goes through [`DataStore`].
//! The production implementation is [`rest::RestStore`]; row-level
//! authorization stays with the store, so per-user calls go through a
//! client obtained from [`DataStore::scoped`].

pub mod query;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
pub use query::{Filter, Order, Query};

pub mod tables {
    pub const COURSES: &str = "courses";
    pub const CHAPTERS: &str = "chapters";
    pub const STUDENT_PROGRESS: &str = "student_progress";
    pub const QUIZZES: &str = "quizzes";
    pub const QUIZ_QUESTIONS: &str = "quiz_questions";
    pub const PROFILES: &str = "profiles";
    pub const UNIVERSITIES: &str = "universities";
}

/// How an upsert treats a row whose conflict key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Overwrite the columns present in the new row.
    Merge,
    /// Keep the existing row untouched.
    Ignore,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<JsonValue>>;

    async fn upsert(
        &self,
        table: &str,
        row: JsonValue,
        on_conflict: &[&'static str],
        resolution: Resolution,
    ) -> Result<Vec<JsonValue>>;

    async fn update(&self, query: &Query, patch: JsonValue) -> Result<Vec<JsonValue>>;

    /// A client acting as the user the access token was issued to.
    fn scoped(&self, access_token: &str) -> Arc<dyn DataStore>;
}

pub async fn fetch_all<T: DeserializeOwned>(store: &dyn DataStore, query: &Query) -> Result<Vec<T>> {
    let rows = store.select(query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}

pub async fn fetch_optional<T: DeserializeOwned>(
    store: &dyn DataStore,
    query: &Query,
) -> Result<Option<T>> {
    let query = query.clone().limit(1);
    let mut rows = store.select(&query).await?;
    match rows.pop() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn DataStore,
    query: &Query,
    what: &str,
) -> Result<T> {
    fetch_optional(store, query)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} not found", what)))
}
