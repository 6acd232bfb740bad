use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::mailer::{EmailTransport, Mailer};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub app: ApplicationSettings,
    pub email_client: EmailClientSettings,
}

/// Which outbound transport the mailer is wired to at startup.
#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Api,
    Noop,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct EmailClientSettings {
    pub transport: TransportKind,
    pub base_url: String,
    pub sender_email: String,
    pub auth_token: SecretString,
    pub timeout_ms: u64,
}

impl EmailClientSettings {
    pub fn transport(self) -> Result<EmailTransport, anyhow::Error> {
        if self.transport == TransportKind::Noop {
            return Ok(EmailTransport::Noop);
        }

        let sender = SubscriberEmail::parse(self.sender_email).map_err(anyhow::Error::msg)?;
        let client = EmailClient::new(
            self.base_url,
            sender,
            self.auth_token,
            Duration::from_millis(self.timeout_ms),
        )?;
        Ok(EmailTransport::Api(client))
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    /// Public site URL, used to build unsubscribe links in emails.
    pub base_url: String,
    pub jwt_secret: SecretString,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    /// Options for the newsletter database itself; statements are traced at TRACE.
    pub fn connect_options(&self) -> PgConnectOptions {
        self.server_options()
            .database(&self.database_name)
            .log_statements(tracing::log::LevelFilter::Trace)
    }

    /// Options for the server, without picking a database.
    pub fn server_options(&self) -> PgConnectOptions {
        let ssl_mode = match self.require_ssl {
            true => PgSslMode::Require,
            false => PgSslMode::Prefer,
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .ssl_mode(ssl_mode)
    }
}

impl Settings {
    /// Builds the mailer once, with the transport picked by configuration.
    pub fn mailer(&self) -> Result<Mailer, anyhow::Error> {
        let transport = self.email_client.clone().transport()?;
        Mailer::new(transport, self.app.base_url.clone())
    }
}

/// Deployment flavour, picks the overlay file under `configuration/`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Local,
    Production,
}

impl Environment {
    fn file_stem(self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}

/// Reads `base.yaml`, then the `APP_ENV` overlay, then `APP_*` variables
/// (`APP_APP__PORT=8080` overrides `app.port`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let conf_dir = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Cannot locate the working directory: {e}")))?
        .join("configuration");
    let env = match std::env::var("APP_ENV") {
        Ok(value) => value.parse().map_err(config::ConfigError::Message)?,
        Err(_) => Environment::default(),
    };

    config::Config::builder()
        .add_source(config::File::from(conf_dir.join("base")))
        .add_source(config::File::from(conf_dir.join(env.file_stem())))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}
