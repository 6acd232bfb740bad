use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::dispatch::SendPlan;
use crate::domain::{IssueContent, IssueStatus, IssueUpdate};
use crate::store::RecipientSelector;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueBody {
    pub subject: Option<String>,
    pub content: Option<String>,
    pub preview_text: Option<String>,
    pub cover_image: Option<String>,
}

impl TryFrom<IssueBody> for IssueContent {
    type Error = String;

    fn try_from(body: IssueBody) -> Result<Self, Self::Error> {
        IssueContent::parse(body.subject, body.content, body.preview_text, body.cover_image)
    }
}

impl TryFrom<IssueBody> for IssueUpdate {
    type Error = String;

    fn try_from(body: IssueBody) -> Result<Self, Self::Error> {
        IssueUpdate::parse(body.subject, body.content, body.preview_text, body.cover_image)
    }
}

#[derive(Deserialize, Debug)]
pub struct ListIssuesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

impl ListIssuesQuery {
    pub fn status(&self) -> Result<Option<IssueStatus>, String> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(IssueStatus::parse)
            .transpose()
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
    pub recipients: Option<String>,
    pub schedule_type: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub custom_recipients: Option<Vec<Uuid>>,
}

impl SendBody {
    /// Missing `recipients` means everyone active, missing `scheduleType` means now.
    pub fn into_plan(self) -> Result<(RecipientSelector, SendPlan), String> {
        let selector = match self.recipients.as_deref().unwrap_or("active") {
            "active" => RecipientSelector::Active,
            "custom" => match self.custom_recipients {
                Some(ids) if !ids.is_empty() => RecipientSelector::Custom(ids),
                _ => return Err("Custom recipients are required when recipients is 'custom'".into()),
            },
            other => return Err(format!("{other} is not a valid recipient selection")),
        };

        let plan = match self.schedule_type.as_deref().unwrap_or("immediate") {
            "immediate" => SendPlan::Immediate,
            "scheduled" => SendPlan::Scheduled(
                self.scheduled_at
                    .ok_or("A scheduled date is required for scheduled newsletters")?,
            ),
            other => return Err(format!("{other} is not a valid schedule type")),
        };

        Ok((selector, plan))
    }
}
