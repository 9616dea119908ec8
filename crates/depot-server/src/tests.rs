//! Router tests: full requests through `router()` against an in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use depot_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, ConfigError, MAX_JWT_EXPIRE_HOURS, ServerConfig, router, seed};

fn test_config() -> ServerConfig {
  ServerConfig {
    jwt_secret: "test-secret".to_string(),
    store_path: ":memory:".into(),
    ..Default::default()
  }
}

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(Arc::new(store), test_config())
}

async fn app() -> Router { router(make_state().await) }

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

/// Register and log in; returns the bearer token.
async fn login_as(app: &Router, email: &str) -> String {
  let (status, _) = send(
    app,
    "POST",
    "/api/register",
    None,
    Some(json!({ "name": "Ada", "email": email, "password": "password" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send(
    app,
    "POST",
    "/api/login",
    None,
    Some(json!({ "email": email, "password": "password" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_widget(app: &Router, token: &str, stock: u32) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/api/items",
    Some(token),
    Some(json!({ "name": "Widget", "stock": stock, "price": "9.99" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["data"]["item"]["id"].as_str().unwrap().to_string()
}

// ── Identity ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_login_profile() {
  let app = app().await;
  let token = login_as(&app, "ada@example.com").await;

  let (status, body) = send(&app, "GET", "/api/profile", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "success");
  assert_eq!(body["data"]["user"]["email"], "ada@example.com");
  assert_eq!(body["data"]["user"]["role"], "user");
  assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
  let app = app().await;
  login_as(&app, "ada@example.com").await;

  let (status, body) = send(
    &app,
    "POST",
    "/api/register",
    None,
    Some(json!({ "name": "Ada 2", "email": "ada@example.com", "password": "password" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["status"], "error");
  assert_eq!(body["code"], 409);
  assert_eq!(body["error"]["kind"], "conflict");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
  let app = app().await;
  login_as(&app, "ada@example.com").await;

  let (status, body) = send(
    &app,
    "POST",
    "/api/login",
    None,
    Some(json!({ "email": "ada@example.com", "password": "nope!!" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"]["kind"], "unauthenticated");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
  let app = app().await;

  for uri in ["/api/profile", "/api/items", "/api/activities", "/api/activities/recent"] {
    let (status, _) = send(&app, "GET", uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
  }

  let (status, body) = send(&app, "GET", "/api/items", Some("not.a.jwt"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"]["kind"], "unauthenticated");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
  let app = app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/api/register")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let res = app.oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Items ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn widget_stock_walkthrough() {
  let app = app().await;
  let token = login_as(&app, "admin@example.com").await;
  let id = create_widget(&app, &token, 10).await;

  let (status, body) = send(
    &app,
    "PATCH",
    &format!("/api/items/{id}/stock"),
    Some(&token),
    Some(json!({ "quantity": 15, "type": "decrement" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["kind"], "insufficient_stock");

  let (_, body) = send(&app, "GET", &format!("/api/items/{id}"), Some(&token), None).await;
  assert_eq!(body["data"]["item"]["stock"], 10);
  let (_, body) = send(&app, "GET", &format!("/api/items/{id}/activities"), Some(&token), None).await;
  assert_eq!(body["meta"]["total_items"], 1);

  let (status, body) = send(
    &app,
    "PATCH",
    &format!("/api/items/{id}/stock"),
    Some(&token),
    Some(json!({ "quantity": 5, "type": "decrement", "reason": "order #7" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["item"]["stock"], 5);

  let (_, body) = send(&app, "GET", &format!("/api/items/{id}/activities"), Some(&token), None).await;
  assert_eq!(body["meta"]["total_items"], 2);
  let newest = &body["data"][0];
  assert_eq!(newest["action"], "STOCK_DECREMENT");
  assert_eq!(newest["old_stock"], 10);
  assert_eq!(newest["new_stock"], 5);
  assert_eq!(newest["description"], "order #7");
}

#[tokio::test]
async fn invalid_stock_requests_are_rejected() {
  let app = app().await;
  let token = login_as(&app, "ada@example.com").await;
  let id = create_widget(&app, &token, 1).await;

  for body in [
    json!({ "quantity": 0, "type": "increment" }),
    json!({ "quantity": -3, "type": "increment" }),
    json!({ "quantity": 1, "type": "sideways" }),
  ] {
    let (status, res) = send(
      &app,
      "PATCH",
      &format!("/api/items/{id}/stock"),
      Some(&token),
      Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(res["error"]["kind"], "invalid_argument");
  }
}

#[tokio::test]
async fn update_reports_changes() {
  let app = app().await;
  let token = login_as(&app, "ada@example.com").await;
  let id = create_widget(&app, &token, 3).await;

  let (status, body) = send(
    &app,
    "PUT",
    &format!("/api/items/{id}"),
    Some(&token),
    Some(json!({ "name": "Gadget", "location": "B-2" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["item"]["name"], "Gadget");
  assert_eq!(body["data"]["item"]["location"], "B-2");
  assert_eq!(body["data"]["item"]["stock"], 3);
  assert_eq!(
    body["data"]["changes"],
    json!({ "name": { "from": "Widget", "to": "Gadget" } })
  );
}

#[tokio::test]
async fn list_and_delete_items() {
  let app = app().await;
  let token = login_as(&app, "ada@example.com").await;
  let id = create_widget(&app, &token, 2).await;

  let (_, body) = send(&app, "GET", "/api/items", Some(&token), None).await;
  assert_eq!(body["data"]["count"], 1);
  assert_eq!(body["data"]["items"][0]["creator"]["name"], "Ada");

  let (status, body) = send(&app, "DELETE", &format!("/api/items/{id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["deleted_item"]["name"], "Widget");

  let (status, body) = send(&app, "GET", &format!("/api/items/{id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"]["kind"], "not_found");

  let (_, body) = send(&app, "GET", &format!("/api/items/{id}/activities"), Some(&token), None).await;
  assert_eq!(body["meta"]["total_items"], 2);
  assert_eq!(body["data"][0]["action"], "ITEM_DELETED");
}

#[tokio::test]
async fn malformed_item_id_is_a_bad_request() {
  let app = app().await;
  let token = login_as(&app, "ada@example.com").await;
  let (status, body) = send(&app, "GET", "/api/items/not-a-uuid", Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["kind"], "invalid_argument");
}

// ── Activities ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn activity_paging_and_filters() {
  let app = app().await;
  let token = login_as(&app, "ada@example.com").await;
  let id = create_widget(&app, &token, 0).await;
  for _ in 0..4 {
    send(
      &app,
      "PATCH",
      &format!("/api/items/{id}/stock"),
      Some(&token),
      Some(json!({ "quantity": 1, "type": "increment" })),
    )
    .await;
  }

  let (status, body) = send(&app, "GET", "/api/activities?page=0&limit=500", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body["meta"],
    json!({
      "page": 1, "limit": 20, "total_items": 5,
      "total_pages": 1, "has_next": false, "has_prev": false,
    })
  );

  let (_, body) = send(&app, "GET", "/api/activities?limit=2&page=2", Some(&token), None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 2);
  assert_eq!(body["meta"]["has_next"], true);
  assert_eq!(body["meta"]["has_prev"], true);

  let (_, body) = send(&app, "GET", "/api/activities?type=ITEM_CREATED", Some(&token), None).await;
  assert_eq!(body["meta"]["total_items"], 1);

  let (status, body) = send(&app, "GET", "/api/activities?type=BOGUS", Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["kind"], "invalid_argument");

  let (_, body) = send(&app, "GET", "/api/activities/recent?limit=3", Some(&token), None).await;
  assert_eq!(body["data"]["count"], 3);
  assert_eq!(body["data"]["activities"][0]["new_stock"], 4);
}

// ── Seeding ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seeding_is_idempotent() {
  let state = make_state().await;

  let first = seed::run(&state.identity, &state.ledger).await.unwrap();
  assert!(first.admin_created);
  assert!(first.items_created > 0);

  let second = seed::run(&state.identity, &state.ledger).await.unwrap();
  assert_eq!(second, seed::SeedReport::default());

  let app = router(state);
  let (status, body) = send(
    &app,
    "POST",
    "/api/login",
    None,
    Some(json!({ "email": seed::ADMIN_EMAIL, "password": seed::ADMIN_PASSWORD })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let token = body["data"]["token"].as_str().unwrap();

  let (_, body) = send(&app, "GET", "/api/profile", Some(token), None).await;
  assert_eq!(body["data"]["user"]["role"], "admin");

  let (_, body) = send(&app, "GET", "/api/activities", Some(token), None).await;
  assert_eq!(body["meta"]["total_items"], first.items_created);
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[test]
fn config_requires_secret_and_sane_token_lifetime() {
  assert_eq!(ServerConfig::default().validate(), Err(ConfigError::MissingJwtSecret));
  assert_eq!(test_config().validate(), Ok(()));

  for hours in [0, -1, MAX_JWT_EXPIRE_HOURS + 1, i64::MAX] {
    let config = ServerConfig { jwt_expire_hours: hours, ..test_config() };
    assert_eq!(
      config.validate(),
      Err(ConfigError::JwtExpireHours { hours, max: MAX_JWT_EXPIRE_HOURS })
    );
  }
}

#[tokio::test]
async fn out_of_range_lifetime_is_clamped_not_fatal() {
  let config = ServerConfig { jwt_expire_hours: i64::MAX, ..test_config() };
  assert_eq!(config.token_ttl(), chrono::Duration::hours(MAX_JWT_EXPIRE_HOURS));
  let negative = ServerConfig { jwt_expire_hours: -5, ..test_config() };
  assert_eq!(negative.token_ttl(), chrono::Duration::hours(1));

  let store = SqliteStore::open_in_memory().await.unwrap();
  let app = router(AppState::new(Arc::new(store), config));
  let token = login_as(&app, "ada@example.com").await;
  let (status, _) = send(&app, "GET", "/api/profile", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
}
