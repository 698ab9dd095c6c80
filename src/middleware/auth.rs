use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

/// Claims of an access token issued by the data store's auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub aud: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct AuthSettings {
    decoding_key: DecodingKey,
    audience: String,
}

impl AuthSettings {
    pub fn new(jwt_secret: &str, audience: impl Into<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            audience: audience.into(),
        }
    }

    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[self.audience.as_str()]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

/// The caller of an authenticated request. The raw token is kept so store
/// calls run under the caller's row-level permissions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

fn reject(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

pub async fn require_bearer_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return reject("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject("unsupported_scheme");
    };

    let Some(claims) = state.auth.verify(token) else {
        tracing::debug!("Rejected access token");
        return reject("invalid_token");
    };
    let Ok(id) = Uuid::parse_str(&claims.sub) else {
        return reject("invalid_subject");
    };

    let user = AuthUser {
        id,
        email: claims.email,
        access_token: token.to_string(),
    };
    req.extensions_mut().insert(user);
    next.run(req).await
}
