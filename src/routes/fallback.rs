//! Fallback route.

use crate::error::AppError;
use axum::{http::StatusCode, response::IntoResponse};

/// Generic 404 handler for unknown paths.
pub async fn notfound_404() -> impl IntoResponse {
    AppError::new(StatusCode::NOT_FOUND, Some("Route not found"))
}
