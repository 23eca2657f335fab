use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::users::repo::{StoreError, UniqueField};

/// Every failure a handler can report. The display string is the client-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    // validation
    #[error("Missing required input")]
    MissingInput,
    #[error("Username and password must be at least 3 and 20 characters long")]
    LengthViolation,
    #[error("Password must be at least 8 and 128 characters long")]
    PasswordLengthViolation,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Username and password cannot be empty")]
    EmptyCredential,
    #[error("Invalid input")]
    InvalidInput,
    #[error("No valid fields to update")]
    NoValidFields,

    #[error("User not found")]
    NotFound,

    #[error("Invalid username or password")]
    InvalidCredentials,

    // conflicts
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Database integrity error: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Storage(String),
    #[error("Server error: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) | ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    code: u16,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorEnvelope {
            code: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation {
                field: UniqueField::Email,
                ..
            } => ApiError::EmailTaken,
            StoreError::UniqueViolation { message, .. } => ApiError::Integrity(message),
            StoreError::Database(e) => ApiError::Storage(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn renders_canonical_error_envelope() {
        let (status, json) = body_json(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, serde_json::json!({"code": 404, "error": "User not found"}));
    }

    #[tokio::test]
    async fn storage_errors_embed_driver_text() {
        let (status, json) = body_json(ApiError::Storage("connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Database error: connection refused");
    }

    #[test]
    fn classifies_statuses() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::UsernameTaken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Integrity("dup".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unexpected("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violation_on_email_becomes_email_taken() {
        let err: ApiError = StoreError::UniqueViolation {
            field: UniqueField::Email,
            message: "duplicate key value violates unique constraint \"users_email_key\"".into(),
        }
        .into();
        assert!(matches!(err, ApiError::EmailTaken));

        let err: ApiError = StoreError::UniqueViolation {
            field: UniqueField::Username,
            message: "duplicate username".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Database integrity error: duplicate username");
    }
}
