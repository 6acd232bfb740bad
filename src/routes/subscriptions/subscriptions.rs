use std::sync::Arc;

use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use tracing::Instrument;

use super::types::{SubscribeBody, UnsubscribeBody};
use crate::{
    domain::{NewSubscriber, Subscriber, UnsubscribeToken},
    mailer::Mailer,
    routes::ApiError,
    store::{
        EMAIL_UNIQUE_CONSTRAINT, find_subscriber_by_email, find_subscriber_by_token,
        insert_subscriber, is_unique_violation, mark_unsubscribed,
    },
};

const DUPLICATE_EMAIL: &str = "Email already subscribed";
const ALREADY_UNSUBSCRIBED: &str = "Already unsubscribed";
const UNKNOWN_TOKEN: &str = "Invalid unsubscribe token";

#[tracing::instrument(
    name = "Adding a new subscriber.",
    skip(body, db_pool, mailer),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    body: web::Json<SubscribeBody>,
    db_pool: web::Data<PgPool>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, ApiError> {
    let new_subscriber: NewSubscriber = body.0.try_into().map_err(ApiError::ValidationError)?;
    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(&new_subscriber.email),
    );

    let existing = find_subscriber_by_email(&db_pool, new_subscriber.email.as_ref())
        .await
        .context("Failed to read data from database.")?;
    if existing.is_some() {
        return Err(ApiError::ConflictError(DUPLICATE_EMAIL.into()));
    }

    let token = UnsubscribeToken::new();
    // A concurrent signup can slip past the pre-check; the unique index has the last word.
    let subscriber = insert_subscriber(&db_pool, &new_subscriber, &token)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, EMAIL_UNIQUE_CONSTRAINT) {
                ApiError::ConflictError(DUPLICATE_EMAIL.into())
            } else {
                anyhow::Error::new(e)
                    .context("Failed to insert a new subscriber in the database.")
                    .into()
            }
        })?;

    spawn_welcome_email(mailer.into_inner(), subscriber.clone());

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Successfully subscribed to newsletter",
        "subscriber": subscriber,
    })))
}

/// Fire and forget: the outcome is only logged.
fn spawn_welcome_email(mailer: Arc<Mailer>, subscriber: Subscriber) {
    tokio::spawn(
        async move {
            mailer.send_welcome(&subscriber).await;
        }
        .instrument(tracing::Span::current()),
    );
}

#[tracing::instrument(name = "Unsubscribing a subscriber.", skip(body, db_pool))]
pub async fn unsubscribe(
    body: web::Json<UnsubscribeBody>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let token = body
        .0
        .token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::ValidationError("Unsubscribe token is required".into()))?;

    // Anything that is not shaped like a token cannot belong to a subscriber.
    let token = UnsubscribeToken::parse(token)
        .map_err(|_| ApiError::NotFoundError(UNKNOWN_TOKEN.into()))?;

    let subscriber = find_subscriber_by_token(&db_pool, &token)
        .await
        .context("Failed to read data from database.")?
        .ok_or_else(|| ApiError::NotFoundError(UNKNOWN_TOKEN.into()))?;

    if !subscriber.is_active() {
        return Err(ApiError::StateError(ALREADY_UNSUBSCRIBED.into()));
    }

    let subscriber = mark_unsubscribed(&db_pool, subscriber.id)
        .await
        .context("Failed to update the subscriber status.")?
        .ok_or_else(|| ApiError::StateError(ALREADY_UNSUBSCRIBED.into()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully unsubscribed from newsletter",
        "subscriber": subscriber,
    })))
}
