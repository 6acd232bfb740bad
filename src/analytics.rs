use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SubscriberCounts {
    pub total: i64,
    pub active: i64,
    pub unsubscribed: i64,
    pub recent_subscriptions: i64,
    pub recent_unsubscriptions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberStats {
    pub total: i64,
    pub active: i64,
    pub unsubscribed: i64,
    pub recent_subscriptions: i64,
    pub recent_unsubscriptions: i64,
    pub growth_rate: String,
}

impl From<SubscriberCounts> for SubscriberStats {
    fn from(c: SubscriberCounts) -> Self {
        Self {
            total: c.total,
            active: c.active,
            unsubscribed: c.unsubscribed,
            recent_subscriptions: c.recent_subscriptions,
            recent_unsubscriptions: c.recent_unsubscriptions,
            growth_rate: percentage(c.recent_subscriptions, c.total),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterStats {
    pub total: i64,
    pub draft: i64,
    pub scheduled: i64,
    pub sent: i64,
    pub total_recipients: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub average_subscribers_per_issue: String,
    pub unsubscribe_rate: String,
}

#[derive(Debug, serde::Serialize)]
pub struct NewsletterAnalytics {
    pub subscribers: SubscriberStats,
    pub newsletters: NewsletterStats,
    pub metrics: DerivedMetrics,
}

/// `part / whole` as a percentage with one decimal, "0.0" for an empty whole.
pub fn percentage(part: i64, whole: i64) -> String {
    ratio(part as f64 * 100.0, whole)
}

fn ratio(numerator: f64, denominator: i64) -> String {
    if denominator == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", numerator / denominator as f64)
}

#[tracing::instrument(name = "Computing subscriber statistics", skip(pool))]
pub async fn subscriber_stats(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<SubscriberStats, sqlx::Error> {
    let since = now - Duration::days(RECENT_WINDOW_DAYS);
    let counts = sqlx::query_as::<_, SubscriberCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'active') AS active,
            COUNT(*) FILTER (WHERE status = 'unsubscribed') AS unsubscribed,
            COUNT(*) FILTER (WHERE subscribed_at >= $1) AS recent_subscriptions,
            COUNT(*) FILTER (WHERE unsubscribed_at >= $1) AS recent_unsubscriptions
        FROM newsletter_subscribers
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(counts.into())
}

#[tracing::instrument(name = "Computing newsletter statistics", skip(pool))]
pub async fn newsletter_stats(pool: &PgPool) -> Result<NewsletterStats, sqlx::Error> {
    sqlx::query_as::<_, NewsletterStats>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'draft') AS draft,
            COUNT(*) FILTER (WHERE status = 'scheduled') AS scheduled,
            COUNT(*) FILTER (WHERE status = 'sent') AS sent,
            COALESCE(SUM(subscriber_count) FILTER (WHERE status = 'sent'), 0)::BIGINT
                AS total_recipients
        FROM newsletters
        "#,
    )
    .fetch_one(pool)
    .await
}

pub fn derived_metrics(subscribers: &SubscriberStats, newsletters: &NewsletterStats) -> DerivedMetrics {
    DerivedMetrics {
        average_subscribers_per_issue: ratio(newsletters.total_recipients as f64, newsletters.sent),
        unsubscribe_rate: percentage(subscribers.unsubscribed, subscribers.total),
    }
}

pub async fn newsletter_analytics(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<NewsletterAnalytics, sqlx::Error> {
    let subscribers = subscriber_stats(pool, now).await?;
    let newsletters = newsletter_stats(pool).await?;
    let metrics = derived_metrics(&subscribers, &newsletters);

    Ok(NewsletterAnalytics {
        subscribers,
        newsletters,
        metrics,
    })
}
