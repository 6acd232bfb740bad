use std::time::Duration;

use chrono::Duration as TokenTtl;
use newsroom::{
    authentication::{JwtSecret, Role, issue_token},
    configuration::{DatabaseSettings, TransportKind, get_configuration},
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use wiremock::MockServer;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
    jwt_secret: JwtSecret,
}

impl TestApp {
    /// A signed token for a freshly minted user with `role`.
    pub fn bearer(&self, role: Role) -> String {
        let token = issue_token(Uuid::new_v4(), role, &self.jwt_secret, TokenTtl::hours(1))
            .expect("Failed to sign a test token.");
        format!("Bearer {token}")
    }

    pub async fn post_subscribe(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/newsletters/subscribe", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_unsubscribe(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/newsletters/unsubscribe", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_as(&self, role: Role, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{path}", &self.address))
            .header("Authorization", self.bearer(role))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_as(&self, role: Role, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}{path}", &self.address))
            .header("Authorization", self.bearer(role))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_as(&self, role: Role, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .put(format!("{}{path}", &self.address))
            .header("Authorization", self.bearer(role))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_as(&self, role: Role, path: &str) -> reqwest::Response {
        self.api_client
            .delete(format!("{}{path}", &self.address))
            .header("Authorization", self.bearer(role))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Subscribes `email` and returns the stored subscriber as JSON.
    pub async fn create_subscriber(&self, name: &str, email: &str) -> serde_json::Value {
        let response = self
            .post_subscribe(&serde_json::json!({"name": name, "email": email}))
            .await
            .error_for_status()
            .expect("Failed to create a subscriber.");
        let body: serde_json::Value = response.json().await.expect("Invalid JSON body.");
        body["subscriber"].clone()
    }

    pub async fn create_unsubscribed_subscriber(&self, name: &str, email: &str) -> serde_json::Value {
        let subscriber = self.create_subscriber(name, email).await;
        let response = self
            .post_unsubscribe(&serde_json::json!({"token": subscriber["unsubscribe_token"]}))
            .await
            .error_for_status()
            .expect("Failed to unsubscribe.");
        let body: serde_json::Value = response.json().await.expect("Invalid JSON body.");
        body["subscriber"].clone()
    }

    pub async fn create_issue(&self, subject: &str) -> serde_json::Value {
        self.post_as(
            Role::Editor,
            "/newsletters",
            &serde_json::json!({
                "subject": subject,
                "content": "<p>Hello <strong>readers</strong></p>",
                "previewText": "This month in short",
            }),
        )
        .await
        .error_for_status()
        .expect("Failed to create a newsletter issue.")
        .json()
        .await
        .expect("Invalid JSON body.")
    }

    /// Welcome emails go out on a detached task; wait until `n` requests reached the mock.
    pub async fn wait_for_emails(&self, n: usize) {
        for _ in 0..50 {
            let received = self
                .email_server
                .received_requests()
                .await
                .map_or(0, |r| r.len());
            if received >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Expected {n} email requests to reach the email server.");
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect_with(&config.server_options())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database");

    let connection_pool = PgPool::connect_with(config.connect_options())
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate database");

    connection_pool
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let config = {
        let mut c = get_configuration().expect("Failed to read configuration");
        c.database.database_name = Uuid::new_v4().to_string();
        c.app.port = 0;
        c.email_client.base_url = email_server.uri();
        c.email_client.transport = TransportKind::Api;
        c
    };

    let db_pool = configure_database(&config.database).await;
    let jwt_secret = JwtSecret(config.app.jwt_secret.clone());

    let app = Application::build(config)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", app.port());
    let _ = tokio::spawn(app.run_until_stopped());

    TestApp {
        address,
        db_pool,
        email_server,
        api_client: reqwest::Client::new(),
        jwt_secret,
    }
}
