use axum::extract::multipart::MultipartError;
use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub const COURSE_NOT_FOUND: &str = "Course not found";
pub const LECTURE_NOT_FOUND: &str = "Lecture not found";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upload error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("File `{field}` exceeds the upload limit of {limit} bytes")]
    PayloadTooLarge { field: String, limit: usize },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Multipart(e) => e.status(),
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Database(e) => {
                error!("database error: {}", e);
                "Database error occurred".to_string()
            }
            AppError::Multipart(e) => e.body_text(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
        });

        (status, body).into_response()
    }
}
