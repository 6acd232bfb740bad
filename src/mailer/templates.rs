use tera::{Context, Tera};

use crate::domain::{NewsletterIssue, Subscriber};

const WELCOME_TEMPLATE: &str = "welcome.html";
const ISSUE_TEMPLATE: &str = "issue.html";

/// Compiled email templates; built once and shared by the mailer.
pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (
                WELCOME_TEMPLATE,
                include_str!("../../views/emails/welcome.html"),
            ),
            (ISSUE_TEMPLATE, include_str!("../../views/emails/issue.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn welcome_html(
        &self,
        subscriber: &Subscriber,
        unsubscribe_link: &str,
    ) -> Result<String, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("name", &subscriber.name);
        ctx.insert("organization", &subscriber.organization);
        ctx.insert("unsubscribe_link", unsubscribe_link);
        self.tera.render(WELCOME_TEMPLATE, &ctx)
    }

    pub fn issue_html(
        &self,
        issue: &NewsletterIssue,
        subscriber: &Subscriber,
        unsubscribe_link: &str,
    ) -> Result<String, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("subject", &issue.subject);
        ctx.insert("preview_text", &issue.preview_text);
        ctx.insert("cover_image", &issue.cover_image);
        ctx.insert("content", &issue.content);
        ctx.insert("name", &subscriber.name);
        ctx.insert("unsubscribe_link", unsubscribe_link);
        self.tera.render(ISSUE_TEMPLATE, &ctx)
    }
}

pub fn unsubscribe_link(base_url: &str, token: &str) -> String {
    format!("{}/unsubscribe?token={token}", base_url.trim_end_matches('/'))
}

pub fn welcome_text(name: &str, link: &str) -> String {
    format!(
        "Welcome, {name}!\n\n\
        Thank you for subscribing to our newsletter.\n\
        You will receive our latest stories, insights and events straight in your inbox.\n\n\
        Not interested anymore? Unsubscribe at any time: {link}\n"
    )
}

pub fn issue_text(issue: &NewsletterIssue, name: &str, link: &str) -> String {
    let preview = issue.preview_text.as_deref().unwrap_or_default();
    format!(
        "{subject}\n\n\
        Hi {name},\n\n\
        {preview}\n\n\
        Read this issue in an HTML capable email client to see the full content.\n\n\
        Unsubscribe: {link}\n",
        subject = issue.subject,
    )
}
