//! Postgres access for subscribers and newsletter issues.

mod issues;
mod subscribers;

pub use issues::{
    delete_issue, get_issue, insert_issue, list_issues, mark_issue_scheduled, mark_issue_sent,
    update_issue,
};
pub use subscribers::{
    EMAIL_UNIQUE_CONSTRAINT, RecipientSelector, SubscriberFilter, delete_subscriber,
    find_subscriber_by_email, find_subscriber_by_token, insert_subscriber, list_subscribers,
    mark_unsubscribed, select_recipients, update_subscriber_status,
};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;
// Keeps `offset()` inside i64 for any limit up to MAX_PAGE_SIZE.
const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// 1-based page request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

pub fn is_unique_violation(e: &sqlx::Error, constraint: &str) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}
