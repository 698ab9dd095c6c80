pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::auth::{require_bearer_auth, AuthSettings};
use crate::store::{rest::RestStore, DataStore};

#[derive(Clone)]
pub struct AppState {
    /// Unscoped store client; handlers call `scoped` with the caller's token.
    pub store: Arc<dyn DataStore>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, auth: AuthSettings) -> Self {
        Self { store, auth }
    }

    pub fn from_config(config: &Config) -> error::Result<Self> {
        let timeout = config.store_timeout_secs.map(Duration::from_secs);
        let store = RestStore::new(&config.store_url, config.store_anon_key.clone(), timeout)?;
        let auth = AuthSettings::new(&config.jwt_secret, config.jwt_audience.clone());
        Ok(Self::new(Arc::new(store), auth))
    }
}

pub fn build_router(state: AppState) -> Router {
    let student_api = Router::new()
        .route("/api/dashboard", get(routes::dashboard::get_dashboard))
        .route("/api/courses", get(routes::courses::list_courses))
        .route("/api/courses/:course_id", get(routes::courses::get_course))
        .route(
            "/api/courses/:course_id/enroll",
            post(routes::courses::enroll),
        )
        .route(
            "/api/courses/:course_id/chapters/:chapter_id",
            get(routes::learning::view_chapter),
        )
        .route(
            "/api/courses/:course_id/chapters/:chapter_id/complete",
            post(routes::learning::complete_chapter),
        )
        .route(
            "/api/chapters/:chapter_id/quiz/:quiz_type",
            get(routes::learning::get_quiz),
        )
        .route(
            "/api/chapters/:chapter_id/quizzes/:quiz_id/submit",
            post(routes::learning::submit_quiz),
        )
        .route(
            "/api/profile",
            get(routes::profile::get_profile).patch(routes::profile::update_profile),
        )
        .route("/api/universities", get(routes::profile::list_universities))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(student_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
