//! API error types with IntoResponse
//!
//! Two outcomes reach clients: a fixed 404 body and a fixed 500 body.
//! Nothing about the underlying failure leaks past the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::repos::DbError;

pub const NOT_FOUND_MESSAGE: &str = "Item not found";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Zero rows matched a by-id operation (404)
    NotFound { resource: &'static str, id: String },

    /// Store or pool failure (500, logged)
    Database(DbError),

    /// Anything else that must look like a store failure (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::NotFound { resource, id } => {
                tracing::debug!(resource, id = %id, "Not found");
                NOT_FOUND_MESSAGE
            }
            Self::Database(DbError::Conflict { resource, id, source }) => {
                tracing::error!(resource, id = %id, "Duplicate key: {}", source);
                INTERNAL_ERROR_MESSAGE
            }
            Self::Database(e) => {
                tracing::error!("Database error: {}", e);
                INTERNAL_ERROR_MESSAGE
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                INTERNAL_ERROR_MESSAGE
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            _ => Self::Database(e),
        }
    }
}
