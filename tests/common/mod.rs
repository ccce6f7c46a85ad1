// tests/common/mod.rs

#![allow(dead_code)]

use quill::{config::Config, db, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::SqlitePool;

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        page_size: 50,
        trending_days: 7,
        cookie_secure: false,
    }
}

/// A fresh in-memory database with migrations applied.
/// One connection, since every in-memory connection is its own database.
pub async fn test_pool() -> SqlitePool {
    db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory SQLite")
}

/// Spawns the app on a random port against a fresh database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let pool = test_pool().await;

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        pool,
        client,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Signs up a user and returns the bearer token.
    pub async fn signup(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.url("/signup/"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123",
                "password_confirm": "password123",
            }))
            .send()
            .await
            .expect("Signup failed");
        assert_eq!(response.status().as_u16(), 201, "signup {}", username);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn create_post(&self, token: &str, body: Value) -> i64 {
        let response = self
            .client
            .post(self.url("/add/"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Create post failed");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn post_json(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn get_json(&self, token: Option<&str>, path: &str) -> Value {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.expect("Request failed");
        assert_eq!(response.status().as_u16(), 200, "GET {}", path);
        response.json().await.unwrap()
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn notification_count(&self, recipient: &str, kind: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM notifications n
            JOIN users u ON u.id = n.recipient_id
            WHERE u.username = ? AND n.kind = ?
            "#,
        )
        .bind(recipient)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}
