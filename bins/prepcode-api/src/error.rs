//! HTTP error mapping.
//!
//! Every failure leaves the service as `{"success": false, "error": "..."}`.
//! Infrastructure details are logged here and replaced by a generic message.

use crate::engine::EngineError;
use crate::executor::GradeError;
use crate::store::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use prepcode_common::types::UnsupportedLanguage;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),

    #[error("Question not found")]
    QuestionNotFound(String),

    #[error("Code execution failed")]
    Engine(#[from] EngineError),

    #[error("Internal server error")]
    Storage(#[from] StoreError),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::QuestionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Engine(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<GradeError> for ApiError {
    fn from(err: GradeError) -> Self {
        match err {
            GradeError::Engine(e) => ApiError::Engine(e),
            GradeError::QuestionNotFound(id) => ApiError::QuestionNotFound(id),
            GradeError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Engine(e) => error!(error = %e, "Engine failure"),
            ApiError::Storage(e) => error!(error = %e, "Storage failure"),
            ApiError::Internal(e) => error!(error = %e, "Internal failure"),
            _ => {}
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("code is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(UnsupportedLanguage("ruby".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::QuestionNotFound("q".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Engine(EngineError::Timeout(10)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_engine_details_hidden() {
        let err = ApiError::Engine(EngineError::Status {
            status: 500,
            message: "internal sandbox path /var/piston".to_string(),
        });
        assert_eq!(err.to_string(), "Code execution failed");
    }

    #[test]
    fn test_unsupported_language_message_kept() {
        let err = ApiError::from(UnsupportedLanguage("ruby".to_string()));
        assert_eq!(err.to_string(), "Unsupported language: ruby");
    }
}
