use actix_web::{HttpResponse, web};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    issues::{ALREADY_SENT, NEWSLETTER_NOT_FOUND},
    types::SendBody,
};
use crate::{
    authentication::{AuthenticatedUser, Role},
    dispatch::{SendPlan, dispatch_issue},
    mailer::Mailer,
    routes::ApiError,
    store,
};

#[tracing::instrument(
    name = "Sending newsletter.",
    skip(body, db_pool, mailer, user),
    fields(user = %&*user)
)]
pub async fn send_newsletter(
    issue_id: web::Path<Uuid>,
    body: web::Json<SendBody>,
    db_pool: web::Data<PgPool>,
    mailer: web::Data<Mailer>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let (selector, plan) = body.0.into_plan().map_err(ApiError::ValidationError)?;
    let not_found = || ApiError::NotFoundError(NEWSLETTER_NOT_FOUND.into());

    let issue = store::get_issue(&db_pool, *issue_id)
        .await
        .context("Failed to read newsletter from database.")?
        .ok_or_else(not_found)?;
    if issue.status.is_final() {
        return Err(ApiError::StateError(ALREADY_SENT.into()));
    }

    match plan {
        SendPlan::Scheduled(scheduled_at) => {
            let issue = store::mark_issue_scheduled(&db_pool, issue.id, scheduled_at)
                .await
                .context("Failed to schedule newsletter issue.")?
                .ok_or_else(not_found)?;

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Newsletter scheduled successfully",
                "newsletter": issue,
            })))
        }
        SendPlan::Immediate => {
            let recipients = store::select_recipients(&db_pool, &selector)
                .await
                .context("Failed to read newsletter recipients from database.")?;

            let report = dispatch_issue(&mailer, &issue, &recipients).await;
            let delivered =
                i32::try_from(report.delivered()).context("Delivered count does not fit the issue record.")?;

            // Only now does the issue leave its previous state. A concurrent send
            // that finished first keeps its own sent_date and count.
            let issue = store::mark_issue_sent(&db_pool, issue.id, delivered)
                .await
                .context("Failed to mark newsletter issue as sent.")?
                .ok_or_else(|| ApiError::StateError(ALREADY_SENT.into()))?;

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": format!("Newsletter sent to {delivered} subscribers"),
                "newsletter": issue,
                "results": report.results,
            })))
        }
    }
}
