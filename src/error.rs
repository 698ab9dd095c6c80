use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {message}")]
    Forbidden { message: String, redirect: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error ({status}, code {code:?}): {message}")]
    Store {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Payment for priced courses is not available yet")]
    PaymentNotAvailable,

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn forbidden(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Error::Forbidden {
            message: message.into(),
            redirect: redirect.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Forbidden { message, redirect } => {
                tracing::warn!(%redirect, "Access denied: {}", message);
                let body = Json(json!({ "error": message, "redirect": redirect }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::PaymentNotAvailable => (
                StatusCode::NOT_IMPLEMENTED,
                "Payment for priced courses is not available yet".to_string(),
            ),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Store {
                status,
                code,
                message,
            } => {
                tracing::error!(status, ?code, "Data store rejected request: {}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    "The request could not be completed. Please try again.".to_string(),
                )
            }
            Error::Reqwest(err) => {
                tracing::error!(error = ?err, "Data store unreachable");
                (
                    StatusCode::BAD_GATEWAY,
                    "The request could not be completed. Please try again.".to_string(),
                )
            }
            Error::Json(err) => {
                tracing::error!(error = %err, "Data store returned an unreadable row");
                (
                    StatusCode::BAD_GATEWAY,
                    "The request could not be completed. Please try again.".to_string(),
                )
            }
            other => {
                tracing::error!(error = ?other, "Unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
