use std::collections::HashSet;

use newsroom::authentication::Role;
use wiremock::{
    Mock, Request, ResponseTemplate,
    matchers::{any, body_partial_json, method, path},
};

use crate::helpers::{TestApp, spawn_app};

const SUBJECT: &str = "October digest";

/// Matches email requests addressed to one of the given recipients.
struct RecipientMatcher(HashSet<String>);

impl wiremock::Match for RecipientMatcher {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<serde_json::Value>(&request.body)
            .ok()
            .and_then(|body| body["to"][0]["email"].as_str().map(str::to_owned))
            .is_some_and(|email| self.0.contains(&email))
    }
}

fn issue_emails() -> wiremock::MockBuilder {
    Mock::given(path("v1/email"))
        .and(method("POST"))
        .and(body_partial_json(serde_json::json!({"subject": SUBJECT})))
}

async fn send(app: &TestApp, issue: &serde_json::Value, body: serde_json::Value) -> reqwest::Response {
    let path = format!("/newsletters/{}/send", issue["id"].as_str().unwrap());
    app.post_as(Role::Editor, &path, &body).await
}

#[tokio::test]
async fn issues_go_to_every_active_subscriber() {
    let app = spawn_app().await;
    app.create_subscriber("Ada", "ada@example.com").await;
    app.create_subscriber("Grace", "grace@example.com").await;
    app.create_unsubscribed_subscriber("Alan", "alan@example.com")
        .await;
    let issue = app.create_issue(SUBJECT).await;

    issue_emails()
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = send(&app, &issue, serde_json::json!({"recipients": "active"})).await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Newsletter sent to 2 subscribers");
    assert_eq!(body["newsletter"]["status"], "sent");
    assert_eq!(body["newsletter"]["subscriber_count"], 2);
    assert!(body["newsletter"]["sent_date"].is_string());

    let emails: HashSet<_> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["email"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(
        emails,
        HashSet::from(["ada@example.com".to_owned(), "grace@example.com".to_owned()])
    );
}

#[tokio::test]
async fn failed_deliveries_are_reported_and_not_counted() {
    let app = spawn_app().await;
    for n in 0..5 {
        app.create_subscriber(&format!("Reader {n}"), &format!("reader{n}@example.com"))
            .await;
    }
    let issue = app.create_issue(SUBJECT).await;
    let failing: HashSet<String> = ["reader1@example.com", "reader4@example.com"]
        .into_iter()
        .map(String::from)
        .collect();

    issue_emails()
        .and(RecipientMatcher(failing.clone()))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&app.email_server)
        .await;
    issue_emails()
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&app.email_server)
        .await;

    let response = send(&app, &issue, serde_json::json!({})).await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["newsletter"]["subscriber_count"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    for result in results {
        let email = result["email"].as_str().unwrap();
        if failing.contains(email) {
            assert_eq!(result["status"], "failed");
            assert!(result["error"].is_string());
        } else {
            assert_eq!(result["status"], "sent");
            assert!(result.get("error").is_none());
        }
    }
}

#[tokio::test]
async fn scheduling_an_issue_sends_nothing() {
    let app = spawn_app().await;
    app.create_subscriber("Ada", "ada@example.com").await;
    let issue = app.create_issue(SUBJECT).await;

    issue_emails()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = send(
        &app,
        &issue,
        serde_json::json!({"scheduleType": "scheduled", "scheduledAt": "2030-01-01T09:00:00Z"}),
    )
    .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Newsletter scheduled successfully");
    assert_eq!(body["newsletter"]["status"], "scheduled");
    assert_eq!(body["newsletter"]["scheduled_date"], "2030-01-01T09:00:00Z");
    assert!(body["newsletter"]["sent_date"].is_null());
}

#[tokio::test]
async fn scheduling_without_a_date_is_rejected() {
    let app = spawn_app().await;
    let issue = app.create_issue(SUBJECT).await;

    let response = send(&app, &issue, serde_json::json!({"scheduleType": "scheduled"})).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn a_scheduled_issue_can_still_be_sent_now() {
    let app = spawn_app().await;
    let issue = app.create_issue(SUBJECT).await;
    send(
        &app,
        &issue,
        serde_json::json!({"scheduleType": "scheduled", "scheduledAt": "2030-01-01T09:00:00Z"}),
    )
    .await
    .error_for_status()
    .unwrap();

    let response = send(&app, &issue, serde_json::json!({"scheduleType": "immediate"})).await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["newsletter"]["status"], "sent");
}

#[tokio::test]
async fn custom_recipients_skip_subscribers_that_are_not_active() {
    let app = spawn_app().await;
    let ada = app.create_subscriber("Ada", "ada@example.com").await;
    app.create_subscriber("Grace", "grace@example.com").await;
    let alan = app
        .create_unsubscribed_subscriber("Alan", "alan@example.com")
        .await;
    let issue = app.create_issue(SUBJECT).await;

    issue_emails()
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = send(
        &app,
        &issue,
        serde_json::json!({
            "recipients": "custom",
            "customRecipients": [ada["id"], alan["id"]],
        }),
    )
    .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["newsletter"]["subscriber_count"], 1);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["email"], "ada@example.com");
}

#[tokio::test]
async fn custom_recipients_must_not_be_empty() {
    let app = spawn_app().await;
    let issue = app.create_issue(SUBJECT).await;

    let response = send(
        &app,
        &issue,
        serde_json::json!({"recipients": "custom", "customRecipients": []}),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn a_sent_issue_cannot_be_sent_again() {
    let app = spawn_app().await;
    app.create_subscriber("Ada", "ada@example.com").await;
    let issue = app.create_issue(SUBJECT).await;

    issue_emails()
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    send(&app, &issue, serde_json::json!({})).await.error_for_status().unwrap();
    let response = send(&app, &issue, serde_json::json!({})).await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Newsletter has already been sent");
}

#[tokio::test]
async fn concurrent_sends_mark_the_issue_sent_only_once() {
    let app = spawn_app().await;
    app.create_subscriber("Ada", "ada@example.com").await;
    let issue = app.create_issue(SUBJECT).await;

    // Slow deliveries keep both batches in flight at the same time.
    issue_emails()
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(300)))
        .mount(&app.email_server)
        .await;

    let (first, second) = tokio::join!(
        send(&app, &issue, serde_json::json!({})),
        send(&app, &issue, serde_json::json!({}))
    );

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [200, 400]);

    let (status, subscriber_count): (String, i32) =
        sqlx::query_as("SELECT status, subscriber_count FROM newsletters WHERE id = $1")
            .bind(uuid::Uuid::parse_str(issue["id"].as_str().unwrap()).unwrap())
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(status, "sent");
    assert_eq!(subscriber_count, 1);
}

#[tokio::test]
async fn sending_an_unknown_issue_returns_404() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_as(
            Role::Editor,
            &format!("/newsletters/{}/send", uuid::Uuid::new_v4()),
            &serde_json::json!({}),
        )
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn authors_cannot_send_issues() {
    let app = spawn_app().await;
    let issue = app.create_issue(SUBJECT).await;
    let path = format!("/newsletters/{}/send", issue["id"].as_str().unwrap());

    let response = app.post_as(Role::Author, &path, &serde_json::json!({})).await;

    assert_eq!(403, response.status().as_u16());
}
