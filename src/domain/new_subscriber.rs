use super::{SubscriberEmail, SubscriberName};

/// A validated signup, ready to be stored.
#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: SubscriberName,
    pub company: Option<String>,
    pub organization: Option<String>,
    pub position: Option<String>,
}

impl NewSubscriber {
    pub fn parse(
        name: Option<String>,
        email: Option<String>,
        company: Option<String>,
        organization: Option<String>,
        position: Option<String>,
    ) -> Result<Self, String> {
        let (Some(name), Some(email)) = (non_blank(name), non_blank(email)) else {
            return Err("Name and email are required".into());
        };

        Ok(Self {
            name: SubscriberName::parse(name)?,
            email: SubscriberEmail::parse(email)?,
            company: non_blank(company),
            organization: non_blank(organization),
            position: non_blank(position),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
