// tests/api_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn signup_works_and_sets_session_cookie() {
    let app = spawn_app().await;
    let unique_name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = app
        .client
        .post(app.url("/signup/"))
        .json(&json!({
            "username": unique_name,
            "email": "someone@example.com",
            "password": "password123",
            "password_confirm": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], unique_name);
    assert_eq!(body["type"], "Bearer");
}

#[tokio::test]
async fn signup_fails_validation() {
    let app = spawn_app().await;

    let cases = [
        json!({"username": "yo", "email": "a@example.com", "password": "password123", "password_confirm": "password123"}),
        json!({"username": "valid_name", "email": "nope", "password": "password123", "password_confirm": "password123"}),
        json!({"username": "valid_name", "email": "a@example.com", "password": "12345678", "password_confirm": "12345678"}),
        json!({"username": "valid_name", "email": "a@example.com", "password": "password123", "password_confirm": "password124"}),
    ];

    for case in cases {
        let response = app
            .client
            .post(app.url("/signup/"))
            .json(&case)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "case: {}", case);
    }
}

#[tokio::test]
async fn duplicate_username_or_email_conflicts() {
    let app = spawn_app().await;
    app.signup("alice").await;

    let same_name = app
        .client
        .post(app.url("/signup/"))
        .json(&json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "password123",
            "password_confirm": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(same_name.status().as_u16(), 409);

    let same_email = app
        .client
        .post(app.url("/signup/"))
        .json(&json!({
            "username": "alice2",
            "email": "ALICE@example.com",
            "password": "password123",
            "password_confirm": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(same_email.status().as_u16(), 409);
}

#[tokio::test]
async fn login_checks_password() {
    let app = spawn_app().await;
    app.signup("alice").await;

    let bad = app
        .client
        .post(app.url("/login/"))
        .json(&json!({"username": "alice", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 401);

    let unknown = app
        .client
        .post(app.url("/login/"))
        .json(&json!({"username": "nobody", "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 401);

    let good: Value = app
        .client
        .post(app.url("/login/"))
        .json(&json!({"username": "alice", "password": "password123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(good["token"].as_str().is_some());
}

#[tokio::test]
async fn protected_routes_require_session() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/add/"))
        .json(&json!({"title": "t", "content": "c"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(app.url("/notifications/"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn index_lists_new_post() {
    let app = spawn_app().await;
    let token = app.signup("alice").await;
    app.create_post(&token, json!({"title": "Test Post", "content": "Test Content"}))
        .await;

    let response = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let text = response.text().await.unwrap();
    assert!(text.contains("Test Post"));
}

#[tokio::test]
async fn post_detail_shows_content() {
    let app = spawn_app().await;
    let token = app.signup("alice").await;
    let id = app
        .create_post(
            &token,
            json!({
                "title": "Test Post",
                "content": "Test Content",
                "image": "https://img.example/cover.png",
                "gallery": ["https://img.example/1.png", "https://img.example/2.png"],
                "tags": "Rust, Web Dev"
            }),
        )
        .await;

    let detail = app.get_json(None, &format!("/post/{}/", id)).await;
    assert_eq!(detail["title"], "Test Post");
    assert_eq!(detail["content"], "Test Content");
    assert_eq!(detail["author"], "alice");
    assert_eq!(detail["image"], "https://img.example/cover.png");
    assert_eq!(detail["images"].as_array().unwrap().len(), 2);
    let slugs: Vec<&str> = detail["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["rust", "web-dev"]);
    // Anonymous viewers get no interaction flags.
    assert!(detail.get("is_liked").is_none());

    let missing = app.client.get(app.url("/post/9999/")).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn post_content_is_sanitized() {
    let app = spawn_app().await;
    let token = app.signup("alice").await;
    let id = app
        .create_post(
            &token,
            json!({
                "title": "xss",
                "content": r#"<p onclick="steal()">Hi</p><script>alert(1)</script><a href="javascript:x()">l</a>"#
            }),
        )
        .await;

    let stored: String = sqlx::query_scalar("SELECT content FROM posts WHERE id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(!stored.contains("script"));
    assert!(!stored.contains("onclick"));
    assert!(!stored.contains("javascript"));
    assert!(stored.starts_with("<p>Hi</p>"));
}

#[tokio::test]
async fn invalid_post_is_rejected() {
    let app = spawn_app().await;
    let token = app.signup("alice").await;

    let response = app
        .client
        .post(app.url("/add/"))
        .bearer_auth(&token)
        .json(&json!({"title": "", "content": "body"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .client
        .post(app.url("/add/"))
        .bearer_auth(&token)
        .json(&json!({"title": "t", "content": "body", "image": "not a url"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn search_functionality() {
    let app = spawn_app().await;
    let token = app.signup("alice").await;
    app.create_post(&token, json!({"title": "Test Post", "content": "Test Content"}))
        .await;
    app.create_post(
        &token,
        json!({"title": "Searchable Post", "content": "Content with KEYWORD"}),
    )
    .await;

    let found = app.get_json(None, "/?q=keyword").await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["items"][0]["title"], "Searchable Post");
    assert_eq!(found["q"], "keyword");

    let by_title = app.get_json(None, "/?q=searchable").await;
    assert_eq!(by_title["total"], 1);

    let none = app.get_json(None, "/?q=nonexistent").await;
    assert_eq!(none["total"], 0);
    assert!(!none.to_string().contains("Searchable Post"));

    // Wildcards in the keyword are literal.
    let literal = app.get_json(None, "/?q=%25").await;
    assert_eq!(literal["total"], 0);
}

#[tokio::test]
async fn search_matches_non_ascii_text() {
    let app = spawn_app().await;
    let token = app.signup("alice").await;
    app.create_post(&token, json!({"title": "Éclair Über", "content": "Pâtisserie"}))
        .await;
    app.create_post(&token, json!({"title": "Plain", "content": "Nothing here"}))
        .await;

    for q in ["%C3%89clair", "%C3%9Cber", "ber", "P%C3%A2tisserie", "%C3%89CLAIR"] {
        let found = app.get_json(None, &format!("/?q={}", q)).await;
        assert_eq!(found["total"], 1, "q={}", q);
        assert_eq!(found["items"][0]["title"], "Éclair Über");
    }
}

#[tokio::test]
async fn feed_is_newest_first_with_counts_and_pages() {
    let mut config = common::test_config();
    config.page_size = 2;
    let app = common::spawn_app_with(config).await;
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let first = app
        .create_post(&alice, json!({"title": "first", "content": "1"}))
        .await;
    app.create_post(&alice, json!({"title": "second", "content": "2"}))
        .await;
    app.create_post(&alice, json!({"title": "third", "content": "3"}))
        .await;

    app.client
        .post(app.url(&format!("/post/{}/comment/", first)))
        .bearer_auth(&bob)
        .json(&json!({"content": "nice"}))
        .send()
        .await
        .unwrap();
    app.post_json(&bob, &format!("/post/like/{}/", first)).await;

    let page1 = app.get_json(None, "/").await;
    assert_eq!(page1["total"], 3);
    assert_eq!(page1["num_pages"], 2);
    assert_eq!(page1["has_next"], true);
    assert_eq!(page1["has_previous"], false);
    let titles: Vec<&str> = page1["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["third", "second"]);

    let page2 = app.get_json(None, "/?page=2").await;
    assert_eq!(page2["items"][0]["title"], "first");
    assert_eq!(page2["items"][0]["comments_count"], 1);
    assert_eq!(page2["items"][0]["total_likes"], 1);

    // Out-of-range and junk page numbers are forgiven.
    assert_eq!(app.get_json(None, "/?page=99").await["page"], 2);
    assert_eq!(app.get_json(None, "/?page=abc").await["page"], 1);
}

#[tokio::test]
async fn cookie_session_flow() {
    let app = common::spawn_app().await;
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let signup = client
        .post(app.url("/signup/"))
        .json(&json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "password123",
            "password_confirm": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(signup.status().as_u16(), 201);

    // Browser-style form post authenticated only by the cookie.
    let created = client
        .post(app.url("/add/"))
        .form(&[("title", "From a form"), ("content", "<b>bold</b>"), ("image", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 303);
    assert_eq!(created.headers()["location"], "/");

    let me: Value = client
        .get(app.url("/profile/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["profile"]["username"], "carol");
    assert_eq!(me["profile"]["posts_count"], 1);

    let logout = client.post(app.url("/logout/")).send().await.unwrap();
    assert_eq!(logout.status().as_u16(), 303);

    let after = client.get(app.url("/profile/")).send().await.unwrap();
    assert_eq!(after.status().as_u16(), 401);
}

#[tokio::test]
async fn profile_edit_and_public_view() {
    let app = spawn_app().await;
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    app.create_post(&alice, json!({"title": "A Post", "content": "c"}))
        .await;

    let updated = app
        .client
        .post(app.url("/profile/"))
        .bearer_auth(&alice)
        .json(&json!({"bio": "Writer", "website": "https://alice.example"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);

    let bad = app
        .client
        .post(app.url("/profile/"))
        .bearer_auth(&alice)
        .json(&json!({"avatar": "not a url"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);

    let public = app.get_json(Some(&bob), "/profile/alice/").await;
    assert_eq!(public["profile"]["bio"], "Writer");
    assert_eq!(public["profile"]["website"], "https://alice.example");
    assert_eq!(public["profile"]["posts_count"], 1);
    assert_eq!(public["profile"]["is_following"], false);
    assert_eq!(public["posts"][0]["title"], "A Post");

    let anonymous = app.get_json(None, "/profile/alice/").await;
    assert!(anonymous["profile"].get("is_following").is_none());

    let missing = app.client.get(app.url("/profile/nobody/")).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}
