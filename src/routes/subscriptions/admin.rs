use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::{ListSubscribersQuery, UpdateStatusBody};
use crate::{
    authentication::{AuthenticatedUser, Role},
    domain::SubscriberStatus,
    routes::{ApiError, Pagination},
    store::{self, Page},
};

const SUBSCRIBER_NOT_FOUND: &str = "Subscriber not found";

#[tracing::instrument(name = "Listing subscribers.", skip(db_pool, user), fields(user = %&*user))]
pub async fn list_subscribers(
    query: web::Query<ListSubscribersQuery>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let filter = query.filter().map_err(ApiError::ValidationError)?;
    let page = Page::new(query.page, query.limit);

    let (subscribers, total) = store::list_subscribers(&db_pool, &filter, page)
        .await
        .context("Failed to read subscribers from database.")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "subscribers": subscribers,
        "pagination": Pagination::new(page, total),
    })))
}

#[tracing::instrument(name = "Updating subscriber status.", skip(body, db_pool, user), fields(user = %&*user))]
pub async fn update_subscriber(
    subscriber_id: web::Path<Uuid>,
    body: web::Json<UpdateStatusBody>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let status = body
        .0
        .status
        .ok_or_else(|| ApiError::ValidationError("Status is required".into()))
        .and_then(|s| SubscriberStatus::parse(&s).map_err(ApiError::ValidationError))?;

    let subscriber = store::update_subscriber_status(&db_pool, *subscriber_id, status)
        .await
        .context("Failed to update the subscriber status.")?
        .ok_or_else(|| ApiError::NotFoundError(SUBSCRIBER_NOT_FOUND.into()))?;

    Ok(HttpResponse::Ok().json(subscriber))
}

#[tracing::instrument(name = "Deleting subscriber.", skip(db_pool, user), fields(user = %&*user))]
pub async fn delete_subscriber(
    subscriber_id: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Admin)?;

    let deleted = store::delete_subscriber(&db_pool, *subscriber_id)
        .await
        .context("Failed to delete the subscriber.")?;
    if !deleted {
        return Err(ApiError::NotFoundError(SUBSCRIBER_NOT_FOUND.into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
