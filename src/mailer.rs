mod templates;

pub use templates::{EmailTemplates, unsubscribe_link};

use crate::domain::{NewsletterIssue, Subscriber, SubscriberEmail};
use crate::email_client::EmailClient;
use crate::routes::error_chain_fmt;

const WELCOME_SUBJECT: &str = "Welcome to our newsletter!";

/// Outbound delivery picked once at startup.
#[derive(Debug)]
pub enum EmailTransport {
    Api(EmailClient),
    /// Accepts every message without sending it anywhere.
    Noop,
}

#[derive(thiserror::Error)]
pub enum MailerError {
    #[error("{0} is not a deliverable email address")]
    InvalidRecipient(String),
    #[error("Failed to render the email template: {0}")]
    Template(#[from] tera::Error),
    #[error("Email transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl std::fmt::Debug for MailerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct Mailer {
    transport: EmailTransport,
    templates: EmailTemplates,
    base_url: String,
}

impl Mailer {
    pub fn new(transport: EmailTransport, base_url: String) -> Result<Self, anyhow::Error> {
        Ok(Self {
            transport,
            templates: EmailTemplates::new()?,
            base_url,
        })
    }

    /// Never fails: a broken welcome email must not affect the signup.
    #[tracing::instrument(
        name = "Sending a welcome email",
        skip(self, subscriber),
        fields(subscriber_email = %subscriber.email)
    )]
    pub async fn send_welcome(&self, subscriber: &Subscriber) -> bool {
        match self.try_send_welcome(subscriber).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to send the welcome email"
                );
                false
            }
        }
    }

    async fn try_send_welcome(&self, subscriber: &Subscriber) -> Result<(), MailerError> {
        let link = unsubscribe_link(&self.base_url, &subscriber.unsubscribe_token);
        let html = self.templates.welcome_html(subscriber, &link)?;
        let text = templates::welcome_text(&subscriber.name, &link);
        self.deliver(&subscriber.email, WELCOME_SUBJECT, &html, &text)
            .await
    }

    /// Errors propagate so that batch sends can report them per recipient.
    #[tracing::instrument(
        name = "Sending a newsletter issue",
        skip(self, issue, subscriber),
        fields(issue_id = %issue.id, subscriber_email = %subscriber.email)
    )]
    pub async fn send_issue(
        &self,
        issue: &NewsletterIssue,
        subscriber: &Subscriber,
    ) -> Result<(), MailerError> {
        let link = unsubscribe_link(&self.base_url, &subscriber.unsubscribe_token);
        let html = self.templates.issue_html(issue, subscriber, &link)?;
        let text = templates::issue_text(issue, &subscriber.name, &link);
        self.deliver(&subscriber.email, &issue.subject, &html, &text)
            .await
    }

    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), MailerError> {
        let recipient = SubscriberEmail::parse(recipient.to_string())
            .map_err(|_| MailerError::InvalidRecipient(recipient.to_string()))?;

        match &self.transport {
            EmailTransport::Api(client) => {
                client.send_email(&recipient, subject, html, text).await?;
            }
            EmailTransport::Noop => {
                tracing::info!(
                    recipient = %recipient,
                    subject,
                    "Email delivery is disabled, dropping the message"
                );
            }
        }
        Ok(())
    }
}
