#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use reqwest::multipart::Form;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use workhub::config::{CompletionPolicy, Config};
use workhub::state::SharedState;

pub const PASSWORD: &str = "password123";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub upload_dir: PathBuf,
    pub state: SharedState,
}

/// A signed-up user.
pub struct TestUser {
    pub id: String,
    pub token: String,
}

/// A project with an accepted bid.
pub struct Engagement {
    pub client: TestUser,
    pub worker: TestUser,
    pub project_id: String,
    pub application_id: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str, role: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name, "role": role }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a user with the given role and return its id and token.
    pub async fn signup(&self, email: &str, role: &str) -> TestUser {
        let (body, status) = self.register(email, PASSWORD, email, role).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_project(&self, token: &str, title: &str, deadline: NaiveDate) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/projects",
                token,
                &json!({
                    "title": title,
                    "description": "Build it",
                    "category": "web",
                    "budget": "500.00",
                    "deadline": deadline,
                    "brief": "Secret requirements",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        body
    }

    pub async fn apply(&self, token: &str, project_id: &str, bid: &str) -> (Value, StatusCode) {
        self.post_auth(
            &format!("/api/v1/projects/{project_id}/apply"),
            token,
            &json!({ "proposal": "I can do this", "bid_amount": bid }),
        )
        .await
    }

    pub async fn accept(&self, token: &str, application_id: &str) -> (Value, StatusCode) {
        self.post_auth(
            &format!("/api/v1/applications/{application_id}/accept"),
            token,
            &json!({}),
        )
        .await
    }

    /// Client posts a project due in 30 days, worker bids, client accepts.
    pub async fn engage(&self) -> Engagement {
        let client = self.signup("client@test.com", "CLIENT").await;
        let worker = self.signup("worker@test.com", "WORKER").await;

        let project = self.create_project(&client.token, "Landing page", days_from_today(30)).await;
        let project_id = project["id"].as_str().unwrap().to_string();

        let (application, status) = self.apply(&worker.token, &project_id, "450.00").await;
        assert_eq!(status, StatusCode::CREATED, "apply failed: {application}");
        let application_id = application["id"].as_str().unwrap().to_string();

        let (body, status) = self.accept(&client.token, &application_id).await;
        assert_eq!(status, StatusCode::OK, "accept failed: {body}");

        Engagement {
            client,
            worker,
            project_id,
            application_id,
        }
    }

    pub async fn submit_links(&self, token: &str, project_id: &str, links: &[&str]) -> (Value, StatusCode) {
        self.post_auth(
            &format!("/api/v1/files/submission/{project_id}"),
            token,
            &json!({ "description": "Here it is", "links": links }),
        )
        .await
    }

    pub async fn review(&self, token: &str, submission_id: &str, verdict: &str, feedback: Option<&str>) -> (Value, StatusCode) {
        self.post_auth(
            &format!("/api/v1/files/submission/{submission_id}/review"),
            token,
            &json!({ "status": verdict, "feedback": feedback }),
        )
        .await
    }

    pub async fn project_status(&self, token: &str, project_id: &str) -> String {
        let (body, status) = self
            .get_auth(&format!("/api/v1/projects/{project_id}"), token)
            .await;
        assert_eq!(status, StatusCode::OK, "get project failed: {body}");
        body["status"].as_str().unwrap().to_string()
    }

    /// Activities of one type recorded for a user, read straight from the table.
    pub async fn count_activities(&self, user_id: &str, activity_type: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activities WHERE user_id = $1 AND activity_type = $2",
        )
        .bind(Uuid::parse_str(user_id).unwrap())
        .bind(activity_type)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_multipart(&self, path: &str, token: &str, form: Form) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("put multipart request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_multipart(&self, path: &str, token: &str, form: Form) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("post multipart request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + chrono::TimeDelta::days(days)
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn a test app after adjusting its configuration.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("workhub_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let upload_dir = std::env::temp_dir().join(&db_name);

    let mut config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        upload_dir: upload_dir.clone(),
        max_upload_size: 1_048_576,
        sweep_hour: 0,
        completion_policy: CompletionPolicy::ConfirmOnly,
        apply_rate_limit: 100,
        apply_rate_window_secs: 3600,
        log_level: "warn".to_string(),
        smtp: None,
    };
    configure(&mut config);

    let (app, state) = workhub::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        upload_dir,
        state,
    }
}

/// Drop the test database and uploads after a test completes.
pub async fn cleanup(app: TestApp) {
    let TestApp {
        pool,
        db_name,
        upload_dir,
        ..
    } = app;
    pool.close().await;
    let _ = tokio::fs::remove_dir_all(&upload_dir).await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
