use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use super::helpers::{error_chain_fmt, json_error};
use crate::authentication::AuthError;

#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    StateError(String),
    #[error(transparent)]
    AuthError(#[from] AuthError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::StateError(_) => StatusCode::BAD_REQUEST,
            ApiError::ConflictError(_) => StatusCode::CONFLICT,
            ApiError::NotFoundError(_) => StatusCode::NOT_FOUND,
            ApiError::AuthError(e) => e.status_code(),
            ApiError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::AuthError(e) => e.error_response(),
            // The full context chain goes back to the caller.
            ApiError::UnexpectedError(e) => json_error(self.status_code(), &format!("{e:#}")),
            _ => json_error(self.status_code(), &self.to_string()),
        }
    }
}
