mod issue_status;
mod new_subscriber;
mod newsletter_issue;
mod subscriber;
mod subscriber_email;
mod subscriber_name;
mod subscriber_status;
mod unsubscribe_token;

pub use issue_status::IssueStatus;
pub use new_subscriber::NewSubscriber;
pub use newsletter_issue::{IssueContent, IssueUpdate, NewsletterIssue};
pub use subscriber::Subscriber;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
pub use subscriber_status::SubscriberStatus;
pub use unsubscribe_token::UnsubscribeToken;
