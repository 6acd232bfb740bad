mod jwt;
mod middleware;

pub use jwt::{Claims, JwtSecret, issue_token, verify_token};
pub use middleware::reject_anonymous_users;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use uuid::Uuid;

use crate::routes::{error_chain_fmt, json_error};

/// Ordered from least to most privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Author,
    Editor,
    Admin,
}

impl Role {
    /// A higher role passes every gate a lower one does.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

/// Verified caller identity, attached to the request by the middleware.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn require(&self, required: Role) -> Result<(), AuthError> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(required))
        }
    }
}

impl std::fmt::Display for AuthenticatedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.user_id, self.role)
    }
}

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredentials(#[source] anyhow::Error),
    #[error("Invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("Insufficient permissions")]
    Forbidden(Role),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials(_) | AuthError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self.status_code(), &self.to_string())
    }
}
