#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Draft,
    Scheduled,
    Sent,
}

impl IssueStatus {
    pub fn parse(status: &str) -> Result<Self, String> {
        match status {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "sent" => Ok(Self::Sent),
            other => Err(format!("{other} is not a valid newsletter status")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
        }
    }

    /// Issues only move forward; a sent issue is final.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Sent)
    }
}
