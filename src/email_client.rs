use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::SubscriberEmail;

/// Thin client for the outbound HTTP email API.
#[derive(Clone, Debug)]
pub struct EmailClient {
    http_client: Client,
    endpoint: Url,
    sender: SubscriberEmail,
    auth_token: SecretString,
}

#[derive(serde::Serialize)]
struct Mailbox<'a> {
    email: &'a str,
}

#[derive(serde::Serialize)]
struct OutgoingEmail<'a> {
    from: Mailbox<'a>,
    to: [Mailbox<'a>; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        auth_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let endpoint = Url::parse(&base_url)
            .and_then(|base| base.join("v1/email"))
            .with_context(|| format!("{base_url} is not a valid email API base url."))?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the email API http client.")?;

        Ok(Self {
            http_client,
            endpoint,
            sender,
            auth_token,
        })
    }

    /// One message to one recipient; non-2xx answers come back as errors.
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), reqwest::Error> {
        let message = OutgoingEmail {
            from: Mailbox {
                email: self.sender.as_ref(),
            },
            to: [Mailbox {
                email: recipient.as_ref(),
            }],
            subject,
            html,
            text,
        };

        self.http_client
            .post(self.endpoint.clone())
            .bearer_auth(self.auth_token.expose_secret())
            .json(&message)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
