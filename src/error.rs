use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::EntityKind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to fetch {0}")]
    Retrieval(EntityKind),

    #[error("Authentication required")]
    Unauthenticated { sign_in_url: String },

    #[error("Invalid page number {page}")]
    InvalidPage { page: i64, total_pages: i64 },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Unauthenticated { sign_in_url } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Sign in to continue".to_string(),
                Some(serde_json::json!({ "sign_in_url": sign_in_url })),
            ),
            AppError::InvalidPage { page, total_pages } => (
                StatusCode::BAD_REQUEST,
                "INVALID_PAGE",
                "Invalid page number. Please navigate back to the first page.".to_string(),
                Some(serde_json::json!({ "page": page, "total_pages": total_pages })),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            AppError::Retrieval(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RETRIEVAL_FAILURE",
                self.to_string(),
                None,
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database unavailable".to_string(),
                None,
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                None,
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
