pub mod analytics;
pub mod authentication;
pub mod configuration;
pub mod dispatch;
pub mod domain;
pub mod email_client;
pub mod mailer;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
