use newsroom::authentication::Role;

use crate::helpers::spawn_app;

#[tokio::test]
async fn creating_an_issue_stores_a_draft() {
    let app = spawn_app().await;

    let response = app
        .post_as(
            Role::Editor,
            "/newsletters",
            &serde_json::json!({
                "subject": "October digest",
                "content": "<p>News</p>",
                "coverImage": "https://cdn.example.com/cover.png",
            }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "draft");
    assert_eq!(body["subscriber_count"], 0);
    assert_eq!(body["cover_image"], "https://cdn.example.com/cover.png");
    assert!(body["sent_date"].is_null());
}

#[tokio::test]
async fn subject_and_content_are_required() {
    let app = spawn_app().await;

    let test_cases = vec![
        serde_json::json!({"content": "<p>News</p>"}),
        serde_json::json!({"subject": "October digest"}),
        serde_json::json!({"subject": " ", "content": "<p>News</p>"}),
    ];

    for body in test_cases {
        let response = app.post_as(Role::Editor, "/newsletters", &body).await;
        assert_eq!(400, response.status().as_u16(), "Payload {body} was accepted.");
    }
}

#[tokio::test]
async fn authors_cannot_manage_issues() {
    let app = spawn_app().await;

    let response = app
        .post_as(
            Role::Author,
            "/newsletters",
            &serde_json::json!({"subject": "s", "content": "c"}),
        )
        .await;

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn issues_are_listed_with_pagination_and_status_filter() {
    let app = spawn_app().await;
    for n in 0..3 {
        app.create_issue(&format!("Issue {n}")).await;
    }

    let body: serde_json::Value = app
        .get_as(Role::Editor, "/newsletters?limit=2")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["newsletters"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["pages"], 2);

    let body: serde_json::Value = app
        .get_as(Role::Editor, "/newsletters?status=sent")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn fetching_an_issue_by_id() {
    let app = spawn_app().await;
    let issue = app.create_issue("October digest").await;

    let response = app
        .get_as(Role::Editor, &format!("/newsletters/{}", issue["id"].as_str().unwrap()))
        .await;
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["subject"], "October digest");

    let response = app
        .get_as(Role::Editor, &format!("/newsletters/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(404, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Newsletter not found");
}

#[tokio::test]
async fn updating_an_issue_only_touches_provided_fields() {
    let app = spawn_app().await;
    let issue = app.create_issue("October digest").await;
    let path = format!("/newsletters/{}", issue["id"].as_str().unwrap());

    let response = app
        .put_as(Role::Editor, &path, &serde_json::json!({"subject": "November digest"}))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["subject"], "November digest");
    assert_eq!(body["content"], issue["content"]);
    assert_eq!(body["status"], "draft");
}

#[tokio::test]
async fn sent_issues_cannot_be_edited() {
    let app = spawn_app().await;
    let issue = app.create_issue("October digest").await;
    let path = format!("/newsletters/{}", issue["id"].as_str().unwrap());
    app.post_as(Role::Editor, &format!("{path}/send"), &serde_json::json!({}))
        .await
        .error_for_status()
        .unwrap();

    let response = app
        .put_as(Role::Editor, &path, &serde_json::json!({"subject": "Too late"}))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Sent newsletters cannot be edited");
}

#[tokio::test]
async fn deleting_an_issue() {
    let app = spawn_app().await;
    let issue = app.create_issue("October digest").await;
    let path = format!("/newsletters/{}", issue["id"].as_str().unwrap());

    let response = app.delete_as(Role::Editor, &path).await;
    assert_eq!(204, response.status().as_u16());

    let response = app.delete_as(Role::Editor, &path).await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn a_non_uuid_id_is_rejected() {
    let app = spawn_app().await;

    let response = app.get_as(Role::Editor, "/newsletters/not-a-uuid").await;

    assert_eq!(400, response.status().as_u16());
}
