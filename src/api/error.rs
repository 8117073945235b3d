use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::AppError;

pub const INVALID_BODY: &str = "Invalid request body";
pub const INTERNAL_ERROR: &str = "Internal server error";

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
    pub request_id: String,
}

#[derive(Debug)]
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

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn invalid_body() -> Self {
        Self::bad_request(INVALID_BODY)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation { message, .. } => ApiError::bad_request(message),
            AppError::NotFound => ApiError::not_found("Not found"),
            AppError::Conflict { message } => ApiError::new(StatusCode::CONFLICT, message),
            AppError::MalformedInput { key, message } => {
                error!(target: "app::api", %key, %message, "refusing to serve malformed stored value");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Stored {key} is malformed"),
                )
            }
            AppError::Remote { message, status } => {
                warn!(target: "app::api", %message, status = ?status, "upstream store failure");
                ApiError::new(StatusCode::BAD_GATEWAY, message)
            }
            other => {
                error!(target: "app::api", error = %other, "unexpected error in handler");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.status.as_u16(),
            request_id: new_request_id(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
