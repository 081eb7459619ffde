use affilink_links::LinkError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

/// Errors returned by the `/v1` routes as `{"error": "..."}`.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<LinkError> for AppError {
    fn from(value: LinkError) -> Self {
        match value {
            LinkError::OfferNotFound { .. }
            | LinkError::CampaignNotFound(_)
            | LinkError::LinkNotFound(_) => Self::NotFound(value.to_string()),
            LinkError::InvalidUrl(_) | LinkError::InvalidArgument(_) => {
                Self::BadRequest(value.to_string())
            }
            LinkError::Conflict(_) => Self::Conflict(value.to_string()),
            LinkError::Storage(e) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
