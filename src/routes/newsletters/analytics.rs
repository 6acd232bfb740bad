use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;

use crate::{
    analytics::newsletter_analytics,
    authentication::{AuthenticatedUser, Role},
    routes::ApiError,
};

#[tracing::instrument(name = "Computing newsletter analytics.", skip(db_pool, user), fields(user = %&*user))]
pub async fn get_analytics(
    db_pool: web::Data<PgPool>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ApiError> {
    user.require(Role::Editor)?;

    let analytics = newsletter_analytics(&db_pool, Utc::now())
        .await
        .context("Failed to compute newsletter analytics.")?;

    Ok(HttpResponse::Ok().json(analytics))
}
