use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use doclink::{DocLinkError, RejectReason};
use serde::{Deserialize, Serialize};

use crate::mail::MailError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No document matches {query:?}")]
    DocumentNotFound { query: String, reason: RejectReason },

    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),

    #[error("Table error: {0}")]
    Table(#[from] DocLinkError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Table row for {document:?} has no link")]
    MissingLink { document: String },

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::DocumentNotFound { .. } | ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Mail(_) => StatusCode::BAD_GATEWAY,
            ServerError::Table(_) | ServerError::MissingLink { .. } | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::DocumentNotFound { .. } | ServerError::NotFound => "NOT_FOUND",
            ServerError::Mail(_) => "MAIL_ERROR",
            ServerError::Table(_) | ServerError::MissingLink { .. } => "TABLE_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::DocumentNotFound { query, reason } => {
                let mut details = serde_json::to_value(reason).ok()?;
                if let Some(map) = details.as_object_mut() {
                    map.insert("query".to_string(), query.clone().into());
                }
                Some(details)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}
