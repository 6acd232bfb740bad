use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::middleware::Next;
use actix_web::{HttpMessage, web};
use anyhow::Context;

use super::{AuthError, AuthenticatedUser, JwtSecret, verify_token};

/// Rejects requests without a valid bearer token and attaches the caller
/// identity for the handlers behind it.
pub async fn reject_anonymous_users(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let user = authenticate(&req)?;
    req.extensions_mut().insert(user);
    next.call(req).await
}

fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedUser, AuthError> {
    let secret = req
        .app_data::<web::Data<JwtSecret>>()
        .context("The JWT secret is not registered as application data.")?;
    let token = bearer_token(req.headers()).map_err(AuthError::MissingCredentials)?;
    let claims = verify_token(token, secret).map_err(AuthError::InvalidToken)?;

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, anyhow::Error> {
    headers
        .get(AUTHORIZATION)
        .context("The 'Authorization' header is missing.")?
        .to_str()
        .context("The 'Authorization' header was not a valid UTF8 string.")?
        .strip_prefix("Bearer ")
        .context("The authorization scheme is not 'Bearer'.")
}
