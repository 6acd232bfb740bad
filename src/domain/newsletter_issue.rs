use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::IssueStatus;

#[derive(Debug, Clone, serde::Serialize)]
pub struct NewsletterIssue {
    pub id: Uuid,
    pub subject: String,
    pub preview_text: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub status: IssueStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub sent_date: Option<DateTime<Utc>>,
    pub subscriber_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable part of an issue, validated on the way in.
#[derive(Debug)]
pub struct IssueContent {
    pub subject: String,
    pub preview_text: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
}

impl IssueContent {
    pub fn parse(
        subject: Option<String>,
        content: Option<String>,
        preview_text: Option<String>,
        cover_image: Option<String>,
    ) -> Result<Self, String> {
        let subject = subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or("Subject is required")?;
        let content = content
            .filter(|c| !c.trim().is_empty())
            .ok_or("Content is required")?;

        Ok(Self {
            subject,
            content,
            preview_text: preview_text.filter(|p| !p.trim().is_empty()),
            cover_image: cover_image.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Default)]
pub struct IssueUpdate {
    pub subject: Option<String>,
    pub preview_text: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
}

impl IssueUpdate {
    pub fn parse(
        subject: Option<String>,
        content: Option<String>,
        preview_text: Option<String>,
        cover_image: Option<String>,
    ) -> Result<Self, String> {
        if subject.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err("Subject cannot be empty".into());
        }
        if content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("Content cannot be empty".into());
        }

        Ok(Self {
            subject: subject.map(|s| s.trim().to_string()),
            preview_text,
            content,
            cover_image,
        })
    }
}
