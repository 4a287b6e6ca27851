mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::{days_from_today, PASSWORD};

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

#[tokio::test]
async fn security_headers_present() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    let headers = resp.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");

    common::cleanup(app).await;
}

// ── Registration & Auth ─────────────────────────────────────────

#[tokio::test]
async fn register_client_and_worker() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("c@test.com", PASSWORD, "Carla", "CLIENT").await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["access_token"].is_string());
    assert_eq!(body["user"]["role"], "CLIENT");
    assert!(body["user"].get("password_hash").is_none());

    let (body, status) = app.register("w@test.com", PASSWORD, "Walt", "WORKER").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "WORKER");

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let app = common::spawn_app().await;
    app.signup("c@test.com", "CLIENT").await;

    let (_, status) = app.register("C@test.com", PASSWORD, "Again", "WORKER").await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_only_on_first_registration() {
    let app = common::spawn_app().await;

    let (_, status) = app.register("root@test.com", PASSWORD, "Root", "ADMIN").await;
    assert_eq!(status, StatusCode::CREATED);

    let (body, status) = app.register("root2@test.com", PASSWORD, "Root", "ADMIN").await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = common::spawn_app().await;

    let (_, status) = app.register("c@test.com", "short", "Carla", "CLIENT").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_valid_and_invalid_credentials() {
    let app = common::spawn_app().await;
    app.signup("c@test.com", "CLIENT").await;

    let (body, status) = app.login("c@test.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let (_, status) = app.login("c@test.com", "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.login("nobody@test.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_brute_force_protection() {
    let app = common::spawn_app().await;
    app.signup("c@test.com", "CLIENT").await;

    for _ in 0..5 {
        let (_, status) = app.login("c@test.com", "wrongpassword").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (_, status) = app.login("c@test.com", PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    common::cleanup(app).await;
}

#[tokio::test]
async fn unauthenticated_requests_rejected() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/projects"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (_, status) = app.get_auth("/api/v1/projects", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Projects ────────────────────────────────────────────────────

#[tokio::test]
async fn project_create_get_list_delete() {
    let app = common::spawn_app().await;
    let client = app.signup("c@test.com", "CLIENT").await;

    let project = app.create_project(&client.token, "Logo", days_from_today(10)).await;
    let id = project["id"].as_str().unwrap();
    assert_eq!(project["status"], "OPEN");
    assert_eq!(project["applicant_count"], 0);
    assert_eq!(project["owner_id"], client.id.as_str());

    let (body, status) = app.get_auth(&format!("/api/v1/projects/{id}"), &client.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Logo");
    assert_eq!(body["brief"], "Secret requirements");

    let (body, status) = app
        .get_auth(&format!("/api/v1/projects?owner={}", client.id), &client.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (body, _) = app.get_auth("/api/v1/projects?status=ONGOING", &client.token).await;
    assert!(body.as_array().unwrap().is_empty());

    let (_, status) = app.delete_auth(&format!("/api/v1/projects/{id}"), &client.token).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth(&format!("/api/v1/projects/{id}"), &client.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn project_validation() {
    let app = common::spawn_app().await;
    let client = app.signup("c@test.com", "CLIENT").await;

    for body in [
        json!({ "title": "", "budget": "10", "deadline": "2030-01-01" }),
        json!({ "title": "Logo", "budget": "-1", "deadline": "2030-01-01" }),
        json!({ "title": "Logo", "budget": "10" }),
    ] {
        let (resp, status) = app.post_auth("/api/v1/projects", &client.token, &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {resp}");
    }

    common::cleanup(app).await;
}

#[tokio::test]
async fn only_clients_post_projects() {
    let app = common::spawn_app().await;
    let worker = app.signup("w@test.com", "WORKER").await;

    let (_, status) = app
        .post_auth(
            "/api/v1/projects",
            &worker.token,
            &json!({ "title": "Logo", "budget": "10", "deadline": "2030-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn only_owner_deletes_and_delete_cascades() {
    let app = common::spawn_app().await;
    let e = app.engage().await;
    let stranger = app.signup("other@test.com", "CLIENT").await;

    let path = format!("/api/v1/projects/{}", e.project_id);
    let (_, status) = app.delete_auth(&path, &stranger.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app.delete_auth(&path, &e.client.token).await;
    assert_eq!(status, StatusCode::OK);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    let contracts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contracts")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(contracts, 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn brief_visible_to_owner_and_accepted_worker_only() {
    let app = common::spawn_app().await;
    let e = app.engage().await;
    let other = app.signup("other@test.com", "WORKER").await;

    let path = format!("/api/v1/projects/{}", e.project_id);

    let (body, _) = app.get_auth(&path, &e.worker.token).await;
    assert_eq!(body["brief"], "Secret requirements");

    let (body, _) = app.get_auth(&path, &other.token).await;
    assert!(body["brief"].is_null());

    common::cleanup(app).await;
}

#[tokio::test]
async fn brief_update_with_attachment() {
    let app = common::spawn_app().await;
    let client = app.signup("c@test.com", "CLIENT").await;
    let project = app.create_project(&client.token, "Logo", days_from_today(10)).await;
    let id = project["id"].as_str().unwrap();

    let form = reqwest::multipart::Form::new()
        .text("brief", "Use the blue palette")
        .part(
            "attachment",
            reqwest::multipart::Part::bytes(b"palette".to_vec()).file_name("palette.txt"),
        );
    let (body, status) = app
        .put_multipart(&format!("/api/v1/projects/{id}/brief"), &client.token, form)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["brief"], "Use the blue palette");

    let attachment = body["brief_attachment"].as_str().unwrap();
    assert!(attachment.starts_with("briefs/"));
    assert!(attachment.ends_with(".txt"));
    let stored = tokio::fs::read(app.upload_dir.join(attachment)).await.unwrap();
    assert_eq!(stored, b"palette");

    common::cleanup(app).await;
}

// ── Applications ────────────────────────────────────────────────

#[tokio::test]
async fn apply_and_list_applications() {
    let app = common::spawn_app().await;
    let client = app.signup("c@test.com", "CLIENT").await;
    let worker = app.signup("w@test.com", "WORKER").await;
    let project = app.create_project(&client.token, "Logo", days_from_today(10)).await;
    let id = project["id"].as_str().unwrap();

    let (body, status) = app.apply(&worker.token, id, "120.50").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["applicant_id"], worker.id.as_str());

    let (body, status) = app
        .get_auth(&format!("/api/v1/projects/{id}/applications"), &client.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, status) = app
        .get_auth(&format!("/api/v1/projects/{id}/applications"), &worker.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (body, _) = app.get_auth("/api/v1/applications/mine", &worker.token).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (body, _) = app.get_auth(&format!("/api/v1/projects/{id}"), &client.token).await;
    assert_eq!(body["applicant_count"], 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn duplicate_apply_conflicts() {
    let app = common::spawn_app().await;
    let client = app.signup("c@test.com", "CLIENT").await;
    let worker = app.signup("w@test.com", "WORKER").await;
    let project = app.create_project(&client.token, "Logo", days_from_today(10)).await;
    let id = project["id"].as_str().unwrap();

    let (_, status) = app.apply(&worker.token, id, "100").await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, status) = app.apply(&worker.token, id, "90").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn apply_requires_worker_and_open_project() {
    let app = common::spawn_app().await;
    let e = app.engage().await;
    let late = app.signup("late@test.com", "WORKER").await;

    let (_, status) = app.apply(&e.client.token, &e.project_id, "100").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app.apply(&late.token, &e.project_id, "100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .apply(&late.token, "00000000-0000-0000-0000-000000000000", "100")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn apply_fails_on_every_non_open_status() {
    let app = common::spawn_app().await;
    let e = app.engage().await;
    let late = app.signup("late@test.com", "WORKER").await;

    // ONGOING: even the accepted worker's duplicate bid is a state error.
    let (_, status) = app.apply(&e.worker.token, &e.project_id, "100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app.submit_links(&e.worker.token, &e.project_id, &["https://deliver.dev"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.project_status(&e.client.token, &e.project_id).await, "DONE");
    let (_, status) = app.apply(&late.token, &e.project_id, "100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/projects/{}/finishing/confirm", e.project_id),
            &e.client.token,
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.project_status(&e.client.token, &e.project_id).await, "CLOSED");
    let (_, status) = app.apply(&late.token, &e.project_id, "100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let lapsed = app
        .create_project(&e.client.token, "Lapsed", days_from_today(-2))
        .await;
    let lapsed_id = lapsed["id"].as_str().unwrap();
    assert_eq!(
        workhub::sweeper::check_and_mark_overdue_projects(&app.state).await.unwrap(),
        1
    );
    assert_eq!(app.project_status(&e.client.token, lapsed_id).await, "OVERDUE");
    let (body, status) = app.apply(&late.token, lapsed_id, "100").await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(applications, 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn apply_rate_limited() {
    let app = common::spawn_app_with(|config| config.apply_rate_limit = 2).await;
    let client = app.signup("c@test.com", "CLIENT").await;
    let worker = app.signup("w@test.com", "WORKER").await;

    let mut statuses = Vec::new();
    for n in 0..3 {
        let project = app
            .create_project(&client.token, &format!("Job {n}"), days_from_today(10))
            .await;
        let (_, status) = app.apply(&worker.token, project["id"].as_str().unwrap(), "10").await;
        statuses.push(status);
    }

    assert_eq!(
        statuses,
        [StatusCode::CREATED, StatusCode::CREATED, StatusCode::TOO_MANY_REQUESTS]
    );

    common::cleanup(app).await;
}

#[tokio::test]
async fn accept_creates_contract_and_starts_project() {
    let app = common::spawn_app().await;
    let e = app.engage().await;

    assert_eq!(app.project_status(&e.client.token, &e.project_id).await, "ONGOING");

    let (contract, status) = app
        .get_auth(&format!("/api/v1/projects/{}/contract", e.project_id), &e.worker.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contract["applicant_id"], e.worker.id.as_str());
    assert_eq!(contract["owner_id"], e.client.id.as_str());

    let (_, status) = app.accept(&e.client.token, &e.application_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn only_owner_accepts_or_rejects() {
    let app = common::spawn_app().await;
    let client = app.signup("c@test.com", "CLIENT").await;
    let worker = app.signup("w@test.com", "WORKER").await;
    let stranger = app.signup("s@test.com", "CLIENT").await;
    let project = app.create_project(&client.token, "Logo", days_from_today(10)).await;
    let (application, _) = app.apply(&worker.token, project["id"].as_str().unwrap(), "10").await;
    let application_id = application["id"].as_str().unwrap();

    let (_, status) = app.accept(&stranger.token, application_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/applications/{application_id}/reject"),
            &client.token,
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "REJECTED");

    let (_, status) = app.accept(&client.token, application_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

// ── Feed ────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_and_activities_follow_the_workflow() {
    let app = common::spawn_app().await;
    let e = app.engage().await;

    let (body, status) = app.get_auth("/api/v1/notifications", &e.client.token).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["notification_type"], "application_received");
    assert_eq!(body["unread_count"], 1);

    let id = notifications[0]["id"].as_str().unwrap();
    let (body, status) = app
        .post_auth(&format!("/api/v1/notifications/{id}/read"), &e.client.token, &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 0);

    // Someone else's notification is not found.
    let (_, status) = app
        .post_auth(&format!("/api/v1/notifications/{id}/read"), &e.worker.token, &json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (body, _) = app.get_auth("/api/v1/notifications", &e.worker.token).await;
    assert_eq!(body["notifications"][0]["notification_type"], "application_accepted");

    let (body, status) = app.get_auth("/api/v1/activities", &e.worker.token).await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["activity_type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"application_submitted"));
    assert!(types.contains(&"application_accepted"));

    common::cleanup(app).await;
}

// ── Admin ───────────────────────────────────────────────────────

#[tokio::test]
async fn manual_sweep_requires_admin() {
    let app = common::spawn_app().await;
    let admin = app.signup("root@test.com", "ADMIN").await;
    let client = app.signup("c@test.com", "CLIENT").await;
    app.create_project(&client.token, "Late", days_from_today(-1)).await;

    let (_, status) = app.post_auth("/api/v1/admin/sweep", &client.token, &json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (body, status) = app.post_auth("/api/v1/admin/sweep", &admin.token, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marked_overdue"], 1);

    let (body, _) = app.post_auth("/api/v1/admin/sweep", &admin.token, &json!({})).await;
    assert_eq!(body["marked_overdue"], 0);

    common::cleanup(app).await;
}
