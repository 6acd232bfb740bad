use serde::Deserialize;

use crate::domain::{NewSubscriber, SubscriberStatus};
use crate::store::SubscriberFilter;

#[derive(Deserialize)]
pub struct SubscribeBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    #[serde(alias = "org")]
    pub organization: Option<String>,
    pub position: Option<String>,
}

impl TryFrom<SubscribeBody> for NewSubscriber {
    type Error = String;

    fn try_from(body: SubscribeBody) -> Result<Self, Self::Error> {
        NewSubscriber::parse(
            body.name,
            body.email,
            body.company,
            body.organization,
            body.position,
        )
    }
}

#[derive(Deserialize)]
pub struct UnsubscribeBody {
    pub token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ListSubscribersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListSubscribersQuery {
    pub fn filter(&self) -> Result<SubscriberFilter, String> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(SubscriberStatus::parse)
            .transpose()?;

        Ok(SubscriberFilter {
            status,
            search: self.search.clone(),
        })
    }
}

#[derive(Deserialize)]
pub struct UpdateStatusBody {
    pub status: Option<String>,
}
