#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use course_portal::{
    build_router,
    error::{Error, Result},
    middleware::auth::AuthSettings,
    store::{DataStore, Filter, Order, Query, Resolution},
    AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Map, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret_key";
pub const AUDIENCE: &str = "authenticated";

/// In-memory stand-in for the hosted store. Filters compare the textual
/// form of column values, like the store's query-string filters do.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Vec<JsonValue>>>>,
}

fn text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &JsonValue, filter: &Filter) -> bool {
    let value = row.get(filter.column()).and_then(text);
    match filter {
        Filter::Eq(_, expected) => value.as_deref() == Some(expected.as_str()),
        Filter::In(_, options) => value.is_some_and(|v| options.contains(&v)),
    }
}

fn compare(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => text(a).cmp(&text(b)),
    }
}

impl MemoryStore {
    pub fn insert(&self, table: &str, row: JsonValue) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<JsonValue> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<JsonValue>> {
        let mut rows: Vec<JsonValue> = self
            .rows(query.table_name())
            .into_iter()
            .filter(|row| query.filters().iter().all(|f| matches(row, f)))
            .collect();
        for (column, order) in query.ordering().iter().rev() {
            rows.sort_by(|a, b| {
                let ord = compare(&a[column.as_str()], &b[column.as_str()]);
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit_value() {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn upsert(
        &self,
        table: &str,
        row: JsonValue,
        on_conflict: &[&'static str],
        resolution: Resolution,
    ) -> Result<Vec<JsonValue>> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let position = rows.iter().position(|existing| {
            on_conflict
                .iter()
                .all(|col| text(&existing[*col]) == text(&row[*col]))
        });
        match (position, resolution) {
            (Some(_), Resolution::Ignore) => Ok(Vec::new()),
            (Some(index), Resolution::Merge) => {
                let existing = &mut rows[index];
                if let (Some(target), Some(patch)) = (existing.as_object_mut(), row.as_object()) {
                    for (key, value) in patch {
                        target.insert(key.clone(), value.clone());
                    }
                }
                Ok(vec![existing.clone()])
            }
            (None, _) => {
                rows.push(row.clone());
                Ok(vec![row])
            }
        }
    }

    async fn update(&self, query: &Query, patch: JsonValue) -> Result<Vec<JsonValue>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get_mut(query.table_name()) else {
            return Ok(Vec::new());
        };
        let patch = patch.as_object().cloned().unwrap_or_else(Map::new);
        let mut updated = Vec::new();
        for row in rows
            .iter_mut()
            .filter(|row| query.filters().iter().all(|f| matches(row, f)))
        {
            if let Some(target) = row.as_object_mut() {
                for (key, value) in &patch {
                    target.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    fn scoped(&self, _access_token: &str) -> Arc<dyn DataStore> {
        Arc::new(self.clone())
    }
}

/// Reads from the wrapped store and rejects every write the way the store
/// does when row-level security refuses it.
#[derive(Clone)]
pub struct RejectingWrites(pub MemoryStore);

fn rejected() -> Error {
    Error::Store {
        status: 403,
        code: Some("42501".into()),
        message: "new row violates row-level security policy for table \"profiles\"".into(),
    }
}

#[async_trait]
impl DataStore for RejectingWrites {
    async fn select(&self, query: &Query) -> Result<Vec<JsonValue>> {
        self.0.select(query).await
    }

    async fn upsert(
        &self,
        _table: &str,
        _row: JsonValue,
        _on_conflict: &[&'static str],
        _resolution: Resolution,
    ) -> Result<Vec<JsonValue>> {
        Err(rejected())
    }

    async fn update(&self, _query: &Query, _patch: JsonValue) -> Result<Vec<JsonValue>> {
        Err(rejected())
    }

    fn scoped(&self, _access_token: &str) -> Arc<dyn DataStore> {
        Arc::new(self.clone())
    }
}

pub fn token_for(user_id: Uuid) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "exp": chrono::Utc::now().timestamp() + 3600,
        "aud": AUDIENCE,
        "email": "student@example.com",
        "role": "authenticated",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn app(store: &MemoryStore) -> Router {
    app_over(Arc::new(store.clone()))
}

pub fn app_over(store: Arc<dyn DataStore>) -> Router {
    build_router(AppState::new(store, AuthSettings::new(JWT_SECRET, AUDIENCE)))
}

pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let res = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

/// Ids of the seeded rows.
pub struct Seed {
    pub student: Uuid,
    pub university: Uuid,
    pub other_university: Uuid,
    pub free_course: Uuid,
    pub priced_course: Uuid,
    pub university_course: Uuid,
    pub foreign_course: Uuid,
    pub gated_chapter: Uuid,
    pub plain_chapter: Uuid,
    pub preview_chapter: Uuid,
    pub locked_chapter: Uuid,
    pub start_quiz: Uuid,
    pub q1: Uuid,
    pub q2: Uuid,
}

fn course(id: Uuid, title: &str, price: &str, course_type: &str, university: Option<Uuid>) -> JsonValue {
    json!({
        "id": id,
        "title": title,
        "description": format!("About {}", title),
        "price": price,
        "currency": "USD",
        "course_type": course_type,
        "category": "science",
        "thumbnail_url": null,
        "university_id": university,
        "is_active": true,
        "is_free": price == "0"
    })
}

fn chapter(id: Uuid, course_id: Uuid, order_index: i32, is_preview: bool, has_start_quiz: bool) -> JsonValue {
    json!({
        "id": id,
        "course_id": course_id,
        "title": format!("Chapter {}", order_index),
        "description": null,
        "content": format!("Body of chapter {}", order_index),
        "video_url": "https://videos.example.com/intro.mp4",
        "order_index": order_index,
        "is_preview": is_preview,
        "has_start_quiz": has_start_quiz,
        "has_end_quiz": false,
        "attachments": null
    })
}

pub fn seed(store: &MemoryStore) -> Seed {
    let s = Seed {
        student: Uuid::new_v4(),
        university: Uuid::new_v4(),
        other_university: Uuid::new_v4(),
        free_course: Uuid::new_v4(),
        priced_course: Uuid::new_v4(),
        university_course: Uuid::new_v4(),
        foreign_course: Uuid::new_v4(),
        gated_chapter: Uuid::new_v4(),
        plain_chapter: Uuid::new_v4(),
        preview_chapter: Uuid::new_v4(),
        locked_chapter: Uuid::new_v4(),
        start_quiz: Uuid::new_v4(),
        q1: Uuid::new_v4(),
        q2: Uuid::new_v4(),
    };

    store.insert("universities", json!({ "id": s.university, "name": "North State", "code": "NSU" }));
    store.insert("universities", json!({ "id": s.other_university, "name": "South Tech", "code": "STU" }));
    store.insert(
        "profiles",
        json!({
            "id": s.student,
            "full_name": "Ana Lima",
            "email": "student@example.com",
            "role": "student",
            "university_id": s.university,
            "purchased_courses": null,
            "major": null,
            "academic_year": null,
            "bio": null
        }),
    );

    store.insert("courses", course(s.free_course, "Biology", "0", "public", None));
    store.insert("courses", course(s.priced_course, "Chemistry", "19.99", "public", None));
    store.insert(
        "courses",
        course(s.university_course, "Algebra", "49", "university", Some(s.university)),
    );
    store.insert(
        "courses",
        course(s.foreign_course, "Physics", "49", "university", Some(s.other_university)),
    );

    store.insert("chapters", chapter(s.plain_chapter, s.free_course, 2, false, false));
    store.insert("chapters", chapter(s.gated_chapter, s.free_course, 1, false, true));
    store.insert("chapters", chapter(s.preview_chapter, s.priced_course, 1, true, false));
    store.insert("chapters", chapter(s.locked_chapter, s.priced_course, 2, false, false));

    store.insert(
        "quizzes",
        json!({
            "id": s.start_quiz,
            "chapter_id": s.gated_chapter,
            "title": "Warm-up",
            "quiz_type": "start",
            "passing_score": 50
        }),
    );
    store.insert(
        "quiz_questions",
        json!({
            "id": s.q1,
            "quiz_id": s.start_quiz,
            "question": "Cells are the basic unit of life.",
            "question_type": "true_false",
            "options": [],
            "correct_answer": "True",
            "explanation": null,
            "order_index": 1
        }),
    );
    store.insert(
        "quiz_questions",
        json!({
            "id": s.q2,
            "quiz_id": s.start_quiz,
            "question": "Which organelle makes ATP?",
            "question_type": "multiple_choice",
            "options": ["Nucleus", "Mitochondrion", "Ribosome"],
            "correct_answer": "Mitochondrion",
            "explanation": "Cellular respiration happens there.",
            "order_index": 2
        }),
    );
    s
}
