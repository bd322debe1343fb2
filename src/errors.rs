use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::ErrorBody;
use crate::services::prediction_service::PredictionError;

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected internal server error occurred.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // Detail has already been logged where the failure was classified.
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string()),
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

impl From<PredictionError> for AppError {
    fn from(value: PredictionError) -> Self {
        match value {
            PredictionError::Internal(detail) => AppError::Internal(detail),
            other => AppError::NotFound(other.to_string()),
        }
    }
}
