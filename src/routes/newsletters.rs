mod analytics;
mod issues;
mod send;
mod types;

pub use analytics::get_analytics;
pub use issues::{
    create_newsletter, delete_newsletter, get_newsletter, list_newsletters, update_newsletter,
};
pub use send::send_newsletter;
