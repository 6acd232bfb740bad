use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Page, decode_error};
use crate::domain::{IssueContent, IssueStatus, IssueUpdate, NewsletterIssue};

#[derive(sqlx::FromRow)]
struct IssueRow {
    id: Uuid,
    subject: String,
    preview_text: Option<String>,
    content: String,
    cover_image: Option<String>,
    status: String,
    scheduled_date: Option<DateTime<Utc>>,
    sent_date: Option<DateTime<Utc>>,
    subscriber_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IssueRow> for NewsletterIssue {
    type Error = sqlx::Error;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        Ok(NewsletterIssue {
            status: IssueStatus::parse(&row.status).map_err(decode_error)?,
            id: row.id,
            subject: row.subject,
            preview_text: row.preview_text,
            content: row.content,
            cover_image: row.cover_image,
            scheduled_date: row.scheduled_date,
            sent_date: row.sent_date,
            subscriber_count: row.subscriber_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[tracing::instrument(name = "Saving new newsletter issue", skip_all)]
pub async fn insert_issue(
    pool: &PgPool,
    content: &IssueContent,
) -> Result<NewsletterIssue, sqlx::Error> {
    let row = sqlx::query_as::<_, IssueRow>(
        r#"
        INSERT INTO newsletters (id, subject, preview_text, content, cover_image, status)
        VALUES ($1, $2, $3, $4, $5, 'draft')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&content.subject)
    .bind(content.preview_text.as_deref())
    .bind(&content.content)
    .bind(content.cover_image.as_deref())
    .fetch_one(pool)
    .await?;

    row.try_into()
}

#[tracing::instrument(name = "Fetching newsletter issue", skip(pool))]
pub async fn get_issue(pool: &PgPool, issue_id: Uuid) -> Result<Option<NewsletterIssue>, sqlx::Error> {
    sqlx::query_as::<_, IssueRow>("SELECT * FROM newsletters WHERE id = $1")
        .bind(issue_id)
        .fetch_optional(pool)
        .await?
        .map(NewsletterIssue::try_from)
        .transpose()
}

#[tracing::instrument(name = "Listing newsletter issues", skip(pool))]
pub async fn list_issues(
    pool: &PgPool,
    status: Option<IssueStatus>,
    page: Page,
) -> Result<(Vec<NewsletterIssue>, i64), sqlx::Error> {
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM newsletters WHERE ($1::TEXT IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, IssueRow>(
        r#"
        SELECT * FROM newsletters
        WHERE ($1::TEXT IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let issues = rows
        .into_iter()
        .map(NewsletterIssue::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((issues, total))
}

/// Sent issues are left untouched and yield `None`.
#[tracing::instrument(name = "Updating newsletter issue", skip(pool, update))]
pub async fn update_issue(
    pool: &PgPool,
    issue_id: Uuid,
    update: &IssueUpdate,
) -> Result<Option<NewsletterIssue>, sqlx::Error> {
    sqlx::query_as::<_, IssueRow>(
        r#"
        UPDATE newsletters
        SET subject = COALESCE($2, subject),
            preview_text = COALESCE($3, preview_text),
            content = COALESCE($4, content),
            cover_image = COALESCE($5, cover_image),
            updated_at = now()
        WHERE id = $1 AND status <> 'sent'
        RETURNING *
        "#,
    )
    .bind(issue_id)
    .bind(update.subject.as_deref())
    .bind(update.preview_text.as_deref())
    .bind(update.content.as_deref())
    .bind(update.cover_image.as_deref())
    .fetch_optional(pool)
    .await?
    .map(NewsletterIssue::try_from)
    .transpose()
}

#[tracing::instrument(name = "Deleting newsletter issue", skip(pool))]
pub async fn delete_issue(pool: &PgPool, issue_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM newsletters WHERE id = $1")
        .bind(issue_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// `None` when another send already finished the issue, or it is gone.
#[tracing::instrument(name = "Marking newsletter issue as sent", skip(pool))]
pub async fn mark_issue_sent(
    pool: &PgPool,
    issue_id: Uuid,
    delivered: i32,
) -> Result<Option<NewsletterIssue>, sqlx::Error> {
    sqlx::query_as::<_, IssueRow>(
        r#"
        UPDATE newsletters
        SET status = 'sent', sent_date = now(), subscriber_count = $2, updated_at = now()
        WHERE id = $1 AND status <> 'sent'
        RETURNING *
        "#,
    )
    .bind(issue_id)
    .bind(delivered)
    .fetch_optional(pool)
    .await?
    .map(NewsletterIssue::try_from)
    .transpose()
}

#[tracing::instrument(name = "Scheduling newsletter issue", skip(pool))]
pub async fn mark_issue_scheduled(
    pool: &PgPool,
    issue_id: Uuid,
    scheduled_at: DateTime<Utc>,
) -> Result<Option<NewsletterIssue>, sqlx::Error> {
    sqlx::query_as::<_, IssueRow>(
        r#"
        UPDATE newsletters
        SET status = 'scheduled', scheduled_date = $2, updated_at = now()
        WHERE id = $1 AND status <> 'sent'
        RETURNING *
        "#,
    )
    .bind(issue_id)
    .bind(scheduled_at)
    .fetch_optional(pool)
    .await?
    .map(NewsletterIssue::try_from)
    .transpose()
}
