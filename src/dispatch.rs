//! Sends one newsletter issue to a list of recipients, one at a time.
//!
//! Every recipient gets exactly one [`DispatchResult`]; a failed delivery is
//! recorded and the loop moves on. Nothing is persisted here, the caller
//! stores the aggregate once the whole batch has been attempted.

use chrono::{DateTime, Utc};

use crate::domain::{NewsletterIssue, Subscriber};
use crate::mailer::Mailer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatchResult {
    pub email: String,
    pub status: DeliveryOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    fn sent(email: &str) -> Self {
        Self {
            email: email.to_string(),
            status: DeliveryOutcome::Sent,
            error: None,
        }
    }

    fn failed(email: &str, error: String) -> Self {
        Self {
            email: email.to_string(),
            status: DeliveryOutcome::Failed,
            error: Some(error),
        }
    }
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    pub results: Vec<DispatchResult>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == DeliveryOutcome::Sent)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.delivered()
    }
}

/// When an issue goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPlan {
    Immediate,
    Scheduled(DateTime<Utc>),
}

#[tracing::instrument(
    name = "Dispatching newsletter issue",
    skip_all,
    fields(issue_id = %issue.id, recipients = recipients.len())
)]
pub async fn dispatch_issue(
    mailer: &Mailer,
    issue: &NewsletterIssue,
    recipients: &[Subscriber],
) -> DispatchReport {
    let mut report = DispatchReport {
        results: Vec::with_capacity(recipients.len()),
    };

    for subscriber in recipients {
        if !subscriber.is_active() {
            tracing::warn!(
                subscriber_id = %subscriber.id,
                "Skipping a recipient that is not an active subscriber"
            );
            continue;
        }

        let result = match mailer.send_issue(issue, subscriber).await {
            Ok(()) => DispatchResult::sent(&subscriber.email),
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    subscriber_email = %subscriber.email,
                    "Failed to deliver newsletter issue"
                );
                DispatchResult::failed(&subscriber.email, e.to_string())
            }
        };
        report.results.push(result);
    }

    tracing::info!(
        delivered = report.delivered(),
        failed = report.failed(),
        "Newsletter issue dispatched"
    );
    report
}
