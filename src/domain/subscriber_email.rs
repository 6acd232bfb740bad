use validator::ValidateEmail;

#[derive(Debug, Clone)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Accepts `local@domain.tld`; a bare host after the `@` is rejected.
    pub fn parse(s: String) -> Result<Self, String> {
        let has_tld = s
            .rsplit_once('@')
            .and_then(|(_, domain)| domain.split_once('.'))
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());

        if !s.validate_email() || !has_tld {
            return Err(format!("{s} is not a valid subscriber email."));
        };
        Ok(Self(s))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubscriberEmail {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        SubscriberEmail::parse(value)
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
