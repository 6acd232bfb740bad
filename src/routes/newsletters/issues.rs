use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::{IssueBody, ListIssuesQuery};
use crate::{
    authentication::{AuthenticatedUser, Role},
    domain::{IssueContent, IssueUpdate},
    routes::{ApiError, Pagination},
    store::{self, Page},
};

pub(super) const NEWSLETTER_NOT_FOUND: &str = "Newsletter not found";
pub(super) const ALREADY_SENT: &str = "Newsletter has already been sent";
const SENT_IS_READ_ONLY: &str = "Sent newsletters cannot be edited";

fn not_found() -> ApiError {
    ApiError::NotFoundError(NEWSLETTER_NOT_FOUND.into())
}

#[tracing::instrument(name = "Listing newsletters.", skip(db_pool, user), fields(user = %&*user))]
pub async fn list_newsletters(
    query: web::Query<ListIssuesQuery>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let status = query.status().map_err(ApiError::ValidationError)?;
    let page = Page::new(query.page, query.limit);

    let (newsletters, total) = store::list_issues(&db_pool, status, page)
        .await
        .context("Failed to read newsletters from database.")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "newsletters": newsletters,
        "pagination": Pagination::new(page, total),
    })))
}

#[tracing::instrument(name = "Fetching newsletter.", skip(db_pool, user), fields(user = %&*user))]
pub async fn get_newsletter(
    issue_id: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let issue = store::get_issue(&db_pool, *issue_id)
        .await
        .context("Failed to read newsletter from database.")?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(issue))
}

#[tracing::instrument(name = "Creating newsletter.", skip(body, db_pool, user), fields(user = %&*user))]
pub async fn create_newsletter(
    body: web::Json<IssueBody>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let content: IssueContent = body.0.try_into().map_err(ApiError::ValidationError)?;
    let issue = store::insert_issue(&db_pool, &content)
        .await
        .context("Failed to store newsletter issue details.")?;

    Ok(HttpResponse::Created().json(issue))
}

#[tracing::instrument(name = "Updating newsletter.", skip(body, db_pool, user), fields(user = %&*user))]
pub async fn update_newsletter(
    issue_id: web::Path<Uuid>,
    body: web::Json<IssueBody>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let update: IssueUpdate = body.0.try_into().map_err(ApiError::ValidationError)?;
    let issue = store::get_issue(&db_pool, *issue_id)
        .await
        .context("Failed to read newsletter from database.")?
        .ok_or_else(not_found)?;
    if issue.status.is_final() {
        return Err(ApiError::StateError(SENT_IS_READ_ONLY.into()));
    }

    // `None` here means the issue went out between the two queries.
    let issue = store::update_issue(&db_pool, issue.id, &update)
        .await
        .context("Failed to update newsletter issue.")?
        .ok_or_else(|| ApiError::StateError(SENT_IS_READ_ONLY.into()))?;

    Ok(HttpResponse::Ok().json(issue))
}

#[tracing::instrument(name = "Deleting newsletter.", skip(db_pool, user), fields(user = %&*user))]
pub async fn delete_newsletter(
    issue_id: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let deleted = store::delete_issue(&db_pool, *issue_id)
        .await
        .context("Failed to delete newsletter issue.")?;
    if !deleted {
        return Err(not_found());
    }

    Ok(HttpResponse::NoContent().finish())
}
