use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use canopy_core::error::AppError;

use crate::dto::ErrorResponse;

/// Error returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request body failed validation.
    Validation(String),
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        let err = match self {
            ApiError::Validation(_) => return (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::App(err) => err,
        };
        match err {
            AppError::InsufficientData { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_data")
            }
            AppError::SerializationError(_) => (StatusCode::BAD_REQUEST, "serialization_error"),
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded"),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            AppError::HttpError(_) | AppError::NetworkError(_) | AppError::RenderError(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();
        let message = match self {
            ApiError::Validation(message) => message,
            ApiError::App(err) => err.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(error = error_type, %message, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}
