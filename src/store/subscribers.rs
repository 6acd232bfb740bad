use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Page, decode_error};
use crate::domain::{NewSubscriber, Subscriber, SubscriberStatus, UnsubscribeToken};

pub const EMAIL_UNIQUE_CONSTRAINT: &str = "newsletter_subscribers_email_key";

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    name: String,
    email: String,
    company: Option<String>,
    organization: Option<String>,
    position: Option<String>,
    status: String,
    subscribed_at: DateTime<Utc>,
    unsubscribed_at: Option<DateTime<Utc>>,
    unsubscribe_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = sqlx::Error;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Subscriber {
            status: SubscriberStatus::parse(&row.status).map_err(decode_error)?,
            id: row.id,
            name: row.name,
            email: row.email,
            company: row.company,
            organization: row.organization,
            position: row.position,
            subscribed_at: row.subscribed_at,
            unsubscribed_at: row.unsubscribed_at,
            unsubscribe_token: row.unsubscribe_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_subscribers(rows: Vec<SubscriberRow>) -> Result<Vec<Subscriber>, sqlx::Error> {
    rows.into_iter().map(Subscriber::try_from).collect()
}

#[derive(Debug, Default)]
pub struct SubscriberFilter {
    pub status: Option<SubscriberStatus>,
    pub search: Option<String>,
}

impl SubscriberFilter {
    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                format!("%{escaped}%")
            })
    }
}

/// Who an issue goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientSelector {
    /// Everyone not unsubscribed.
    Active,
    /// Exactly these ids; status is not looked at here.
    Custom(Vec<Uuid>),
}

#[tracing::instrument(name = "Trying to find existing subscriber by email", skip(pool))]
pub async fn find_subscriber_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, SubscriberRow>("SELECT * FROM newsletter_subscribers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .map(Subscriber::try_from)
        .transpose()
}

#[tracing::instrument(name = "Looking up subscriber by unsubscribe token", skip_all)]
pub async fn find_subscriber_by_token(
    pool: &PgPool,
    token: &UnsubscribeToken,
) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, SubscriberRow>(
        "SELECT * FROM newsletter_subscribers WHERE unsubscribe_token = $1",
    )
    .bind(token.as_ref())
    .fetch_optional(pool)
    .await?
    .map(Subscriber::try_from)
    .transpose()
}

#[tracing::instrument(
    name = "Saving new subscriber details in the database",
    skip(new_subscriber, token, pool)
)]
pub async fn insert_subscriber(
    pool: &PgPool,
    new_subscriber: &NewSubscriber,
    token: &UnsubscribeToken,
) -> Result<Subscriber, sqlx::Error> {
    let row = sqlx::query_as::<_, SubscriberRow>(
        r#"
        INSERT INTO newsletter_subscribers (
            id, name, email, company, organization, position,
            status, subscribed_at, unsubscribe_token
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_subscriber.name.as_ref())
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.company.as_deref())
    .bind(new_subscriber.organization.as_deref())
    .bind(new_subscriber.position.as_deref())
    .bind(Utc::now())
    .bind(token.as_ref())
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// `None` when the row is gone or was already unsubscribed.
#[tracing::instrument(name = "Marking subscriber as unsubscribed", skip(pool))]
pub async fn mark_unsubscribed(
    pool: &PgPool,
    subscriber_id: Uuid,
) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, SubscriberRow>(
        r#"
        UPDATE newsletter_subscribers
        SET status = 'unsubscribed', unsubscribed_at = now(), updated_at = now()
        WHERE id = $1 AND status = 'active'
        RETURNING *
        "#,
    )
    .bind(subscriber_id)
    .fetch_optional(pool)
    .await?
    .map(Subscriber::try_from)
    .transpose()
}

#[tracing::instrument(name = "Listing subscribers", skip(pool))]
pub async fn list_subscribers(
    pool: &PgPool,
    filter: &SubscriberFilter,
    page: Page,
) -> Result<(Vec<Subscriber>, i64), sqlx::Error> {
    let status = filter.status.map(|s| s.as_str());
    let pattern = filter.search_pattern();

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM newsletter_subscribers
        WHERE ($1::TEXT IS NULL OR status = $1)
          AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
        "#,
    )
    .bind(status)
    .bind(pattern.as_deref())
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, SubscriberRow>(
        r#"
        SELECT * FROM newsletter_subscribers
        WHERE ($1::TEXT IS NULL OR status = $1)
          AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
        ORDER BY subscribed_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(status)
    .bind(pattern.as_deref())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((into_subscribers(rows)?, total))
}

/// Keeps `unsubscribed_at` in step with the new status.
#[tracing::instrument(name = "Updating subscriber status", skip(pool))]
pub async fn update_subscriber_status(
    pool: &PgPool,
    subscriber_id: Uuid,
    status: SubscriberStatus,
) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, SubscriberRow>(
        r#"
        UPDATE newsletter_subscribers
        SET status = $2::TEXT,
            unsubscribed_at = CASE
                WHEN $2::TEXT = 'active' THEN NULL
                ELSE COALESCE(unsubscribed_at, now())
            END,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(subscriber_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?
    .map(Subscriber::try_from)
    .transpose()
}

#[tracing::instrument(name = "Deleting subscriber", skip(pool))]
pub async fn delete_subscriber(pool: &PgPool, subscriber_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM newsletter_subscribers WHERE id = $1")
        .bind(subscriber_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[tracing::instrument(name = "Selecting newsletter recipients", skip(pool))]
pub async fn select_recipients(
    pool: &PgPool,
    selector: &RecipientSelector,
) -> Result<Vec<Subscriber>, sqlx::Error> {
    let rows = match selector {
        RecipientSelector::Active => {
            sqlx::query_as::<_, SubscriberRow>(
                r#"
                SELECT * FROM newsletter_subscribers
                WHERE status <> 'unsubscribed'
                ORDER BY subscribed_at
                "#,
            )
            .fetch_all(pool)
            .await?
        }
        RecipientSelector::Custom(ids) => {
            sqlx::query_as::<_, SubscriberRow>(
                r#"
                SELECT * FROM newsletter_subscribers
                WHERE id = ANY($1)
                ORDER BY subscribed_at
                "#,
            )
            .bind(ids)
            .fetch_all(pool)
            .await?
        }
    };

    into_subscribers(rows)
}
