//! Error responses for the reminder endpoints.
//!
//! Every failure is rendered as:
//!
//! ```json
//! { "error": "Failed to fetch cook subscriptions: database error: ..." }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::ReminderError;
use crate::jobs::JobError;

/// JSON body of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error returned from a handler, with its HTTP status.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<ReminderError> for ApiError {
    fn from(err: ReminderError) -> Self {
        ApiError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_errors_are_internal() {
        let err: ApiError = JobError::PersistFailed("disk full".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to create notifications: disk full");
    }

    #[test]
    fn body_has_single_error_field() {
        let json = serde_json::to_value(ErrorBody {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "error": "boom" }));
    }
}
