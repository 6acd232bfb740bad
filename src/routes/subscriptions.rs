mod admin;
mod subscriptions;
mod types;

pub use admin::{delete_subscriber, list_subscribers, update_subscriber};
pub use subscriptions::{subscribe, unsubscribe};
