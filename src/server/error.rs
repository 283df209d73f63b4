use crate::api::types::ErrorResponse;
use crate::db::tasks::StoreError;
use crate::libs::reconcile::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Failure of a request, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid CSRF token")]
    InvalidCsrfToken,
    #[error("Too many login attempts, please try again later")]
    TooManyAttempts,
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid request body: {0}")]
    BadRequest(String),
    #[error("Failed to load tasks")]
    Load(#[source] StoreError),
    #[error("Failed to save tasks")]
    Save(#[source] StoreError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized | ServerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServerError::InvalidCsrfToken => StatusCode::FORBIDDEN,
            ServerError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Load(_) | ServerError::Save(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ServerError::Load(e) | ServerError::Save(e) => tracing::error!(error = %e, "{}", self),
            _ => tracing::debug!(status = status.as_u16(), "{}", self),
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
