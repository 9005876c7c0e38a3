//! JSON REST API for Wayfare.
//!
//! Exposes axum [`Router`]s backed by any [`wayfare_core::store::TravelStore`]
//! / [`wayfare_core::store::NotificationStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", wayfare_api::router(store.clone()))
//! ```

pub mod error;
pub mod notifications;
pub mod profiles;
pub mod travels;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use serde::Deserialize;
use wayfare_core::store::{NotificationStore, TravelStore};

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:    String,
  pub port:    u16,
  pub db_path: PathBuf,
}

// ─── Routers ──────────────────────────────────────────────────────────────────

/// Build the travel/profile API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TravelStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Travels
    .route("/travels", get(travels::list::<S>).post(travels::create::<S>))
    .route(
      "/travels/{id}",
      get(travels::get_one::<S>)
        .put(travels::update::<S>)
        .delete(travels::delete_one::<S>),
    )
    .route(
      "/travels/{id}/participants",
      post(travels::add_participant::<S>),
    )
    .route(
      "/travels/{id}/participants/{uid}",
      delete(travels::remove_participant::<S>),
    )
    .route("/travels/{id}/events", get(travels::events::<S>))
    // Profiles
    .route("/profiles", get(profiles::by_email::<S>))
    .route(
      "/profiles/{id}",
      get(profiles::get_one::<S>).put(profiles::upsert::<S>),
    )
    .with_state(store)
}

/// Build the notification API router for `store`.
pub fn notification_router<S>(store: Arc<S>) -> Router<()>
where
  S: NotificationStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route(
      "/notifications",
      get(notifications::list::<S>).post(notifications::create::<S>),
    )
    .route(
      "/notifications/{id}/read",
      post(notifications::mark_read::<S>),
    )
    .with_state(store)
}

/// The full API surface for a backend that implements both store traits.
pub fn router<S>(store: Arc<S>) -> Router<()>
where
  S: TravelStore + NotificationStore + Clone + Send + Sync + 'static,
{
  api_router(store.clone()).merge(notification_router(store))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use wayfare_store_sqlite::SqliteStore;

  const U1: &str = "u1AAAAAAAAAAAAAAAAAA";
  const U2: &str = "u2AAAAAAAAAAAAAAAAAA";
  const T1: &str = "t1BBBBBBBBBBBBBBBBBB";

  async fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn send(
    store: &Arc<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(Arc::clone(store)).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn profile_body(username: &str, email: &str) -> Value {
    json!({ "username": username, "email": email, "name": username })
  }

  fn travel_body(uid: &str, owner: &str) -> Value {
    let mut body = json!({
      "uid": uid,
      "title": "Summer in Portugal",
      "description": "Two weeks along the coast",
      "start": "2024-07-01T00:00:00Z",
      "end": "2024-07-15T00:00:00Z",
      "location": { "latitude": 38.7223, "longitude": -9.1393, "name": "Lisbon" },
      "participants": {},
    });
    body["participants"][owner] = json!("owner");
    body
  }

  async fn seed_profiles(s: &Arc<SqliteStore>) {
    for (uid, email) in [(U1, "u1@example.com"), (U2, "u2@example.com")] {
      let resp = send(
        s,
        "PUT",
        &format!("/profiles/{uid}"),
        Some(profile_body(uid, email)),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::OK);
    }
  }

  // ── Profiles ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn put_then_get_profile() {
    let s = store().await;
    seed_profiles(&s).await;

    let resp = send(&s, "GET", &format!("/profiles/{U1}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["email"], "u1@example.com");
  }

  #[tokio::test]
  async fn get_missing_profile_returns_404() {
    let s = store().await;
    let resp = send(&s, "GET", &format!("/profiles/{U1}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn profile_by_email_returns_null_when_ambiguous() {
    let s = store().await;
    for uid in [U1, U2] {
      send(
        &s,
        "PUT",
        &format!("/profiles/{uid}"),
        Some(profile_body(uid, "shared@example.com")),
      )
      .await;
    }

    let resp = send(&s, "GET", "/profiles?email=shared@example.com", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, Value::Null);
  }

  // ── Travels ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_travel_returns_201_and_is_fetchable() {
    let s = store().await;
    seed_profiles(&s).await;

    let resp = send(&s, "POST", "/travels", Some(travel_body(T1, U1))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&s, "GET", &format!("/travels/{T1}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["title"], "Summer in Portugal");
    assert_eq!(json["participants"][U1], "owner");
  }

  #[tokio::test]
  async fn create_travel_with_blank_title_returns_400() {
    let s = store().await;
    seed_profiles(&s).await;

    let mut body = travel_body(T1, U1);
    body["title"] = json!("   ");
    let resp = send(&s, "POST", "/travels", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn get_missing_travel_returns_404() {
    let s = store().await;
    let resp = send(&s, "GET", &format!("/travels/{T1}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn list_travels_filters_by_user() {
    let s = store().await;
    seed_profiles(&s).await;
    send(&s, "POST", "/travels", Some(travel_body(T1, U1))).await;

    let resp = send(&s, "GET", &format!("/travels?user={U1}"), None).await;
    let json = body_json(resp).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let resp = send(&s, "GET", &format!("/travels?user={U2}"), None).await;
    let json = body_json(resp).await;
    assert!(json.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn add_participant_updates_roster_and_journal() {
    let s = store().await;
    seed_profiles(&s).await;
    send(&s, "POST", "/travels", Some(travel_body(T1, U1))).await;

    let resp = send(
      &s,
      "POST",
      &format!("/travels/{T1}/participants"),
      Some(json!({ "user": U2 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["participants"][U2], "participant");

    let resp = send(&s, "GET", &format!("/travels/{T1}/events"), None).await;
    let events = body_json(resp).await;
    let kinds: Vec<_> = events
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["kind"].as_str().unwrap().to_owned())
      .collect();
    assert_eq!(kinds, vec!["start_of_journey", "new_participant"]);
  }

  #[tokio::test]
  async fn removing_the_last_owner_returns_400() {
    let s = store().await;
    seed_profiles(&s).await;
    send(&s, "POST", "/travels", Some(travel_body(T1, U1))).await;

    let resp = send(
      &s,
      "DELETE",
      &format!("/travels/{T1}/participants/{U1}"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn delete_travel_returns_204_then_404() {
    let s = store().await;
    seed_profiles(&s).await;
    send(&s, "POST", "/travels", Some(travel_body(T1, U1))).await;

    let resp = send(&s, "DELETE", &format!("/travels/{T1}"), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&s, "GET", &format!("/travels/{T1}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Notifications ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn notification_round_trip_and_mark_read() {
    let s = store().await;

    let resp = send(
      &s,
      "POST",
      "/notifications",
      Some(json!({
        "to": U1,
        "from": U2,
        "content": { "type": "friend_invitation", "data": { "from_name": "Bob" } },
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_owned();

    let resp = send(&s, "GET", &format!("/notifications?user={U1}"), None).await;
    let inbox = body_json(resp).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["read"], json!(false));

    let resp = send(&s, "POST", &format!("/notifications/{id}/read"), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&s, "GET", &format!("/notifications?user={U1}"), None).await;
    let inbox = body_json(resp).await;
    assert_eq!(inbox[0]["read"], json!(true));
  }

  #[tokio::test]
  async fn blank_notification_text_returns_400() {
    let s = store().await;
    let resp = send(
      &s,
      "POST",
      "/notifications",
      Some(json!({
        "to": U1,
        "from": U2,
        "content": { "type": "friend_invitation", "data": { "from_name": "  " } },
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
