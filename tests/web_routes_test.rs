//! Integration tests for the JSON API routes: actor resolution from
//! session rows and the error-to-status mapping.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use forum_engine::config::Config;
use forum_engine::db::{self, Database};
use forum_engine::identity::{generate_session_token, Role, SessionDuration};
use forum_engine::web::{create_app, AppState};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_app() -> (Router, Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let database = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    let config = Config::from_env().expect("Failed to create config");
    let state = AppState {
        db: database.clone(),
        config: Arc::new(config),
    };

    (create_app(state), database, temp_dir)
}

/// Provision a session the way the surrounding platform would.
async fn seed_session(database: &Database, actor_id: i64, role: Role) -> String {
    let token = generate_session_token();
    let expires_at = SessionDuration::Long.expires_at();
    db::insert_session(database.pool(), &token, actor_id, role.as_str(), &expires_at)
        .await
        .expect("Failed to seed session");
    token
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("cookie", format!("session={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("cookie", format!("session={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

fn category_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Usability",
        "slug": "usability",
        "description": "General usability evaluation discussion",
        "order": 0
    })
}

fn topic_body() -> serde_json::Value {
    serde_json::json!({
        "title": "Heurísticas",
        "content": "Nielsen's heuristics applied to our latest prototype"
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _db, _tmp) = setup_app().await;

    let response = app.oneshot(get_request("/healthz", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_guest_reads_but_cannot_mutate() {
    let (app, _db, _tmp) = setup_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/categories", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/categories", None, category_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_category_and_conflicts_map_to_409() {
    let (app, database, _tmp) = setup_app().await;
    let admin = seed_session(&database, 100, Role::Admin).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/categories",
            Some(&admin),
            category_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["slug"], "usability");

    let response = app
        .oneshot(json_request(
            "POST",
            "/categories",
            Some(&admin),
            category_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_member_cannot_manage_categories() {
    let (app, database, _tmp) = setup_app().await;
    let member = seed_session(&database, 1, Role::Member).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/categories",
            Some(&member),
            category_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_topic_creation_view_counting_and_validation() {
    let (app, database, _tmp) = setup_app().await;
    let admin = seed_session(&database, 100, Role::Admin).await;
    let member = seed_session(&database, 1, Role::Member).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/categories",
            Some(&admin),
            category_body(),
        ))
        .await
        .unwrap();
    let category = body_json(response).await;
    let category_id = category["id"].as_i64().unwrap();

    // Malformed title -> 400
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/categories/{category_id}/topics"),
            Some(&member),
            serde_json::json!({"title": "abc", "content": "Long enough body for the bound."}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid creation -> 201, slug derived
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/categories/{category_id}/topics"),
            Some(&member),
            topic_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let topic = body_json(response).await;
    assert_eq!(topic["slug"], "heuristicas");
    let topic_id = topic["id"].as_i64().unwrap();

    // Reading the topic counts a view, guests included.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/topics/{topic_id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let viewed = body_json(response).await;
    assert_eq!(viewed["views"], 1);

    // Missing topic -> 404
    let response = app
        .oneshot(get_request("/topics/99999", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lock_gates_member_posts_over_http() {
    let (app, database, _tmp) = setup_app().await;
    let admin = seed_session(&database, 100, Role::Admin).await;
    let alice = seed_session(&database, 1, Role::Member).await;
    let bob = seed_session(&database, 2, Role::Moderator).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/categories",
            Some(&admin),
            category_body(),
        ))
        .await
        .unwrap();
    let category_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/categories/{category_id}/topics"),
            Some(&alice),
            topic_body(),
        ))
        .await
        .unwrap();
    let topic_id = body_json(response).await["id"].as_i64().unwrap();

    // Member cannot lock
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/topics/{topic_id}/lock"),
            Some(&alice),
            serde_json::json!({"locked": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Moderator locks
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/topics/{topic_id}/lock"),
            Some(&bob),
            serde_json::json!({"locked": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Locked: member post -> 403, moderator post -> 201
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/topics/{topic_id}/posts"),
            Some(&alice),
            serde_json::json!({"content": "Blocked reply"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/topics/{topic_id}/posts"),
            Some(&bob),
            serde_json::json!({"content": "Allowed reply"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = body_json(response).await;
    assert_eq!(post["content"], "Allowed reply");
}

#[tokio::test]
async fn test_moderation_queue_statuses() {
    let (app, database, _tmp) = setup_app().await;
    let member = seed_session(&database, 1, Role::Member).await;
    let moderator = seed_session(&database, 2, Role::Moderator).await;

    let response = app
        .clone()
        .oneshot(get_request("/moderation/reported", Some(&member)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_request("/moderation/reported", Some(&moderator)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response).await;
    assert!(items.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bearer_token_resolves_actor() {
    let (app, database, _tmp) = setup_app().await;
    let admin = seed_session(&database, 100, Role::Admin).await;

    let request = Request::builder()
        .method("POST")
        .uri("/categories")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {admin}"))
        .body(Body::from(category_body().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_expired_session_resolves_to_guest() {
    let (app, database, _tmp) = setup_app().await;

    let token = generate_session_token();
    let expired = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    db::insert_session(database.pool(), &token, 100, Role::Admin.as_str(), &expired)
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/categories",
            Some(&token),
            category_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
