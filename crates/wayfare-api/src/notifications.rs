//! Handlers for `/notifications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications?user=<uid>` | Inbox, newest first |
//! | `POST` | `/notifications` | Body: [`SendBody`]; returns 201 |
//! | `POST` | `/notifications/:id/read` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use wayfare_core::{
  notification::{Notification, NotificationContent},
  store::NotificationStore,
  uid::Uid,
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user: Uid,
}

/// `GET /notifications?user=<uid>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: NotificationStore,
{
  let inbox = store
    .notifications_for_user(&params.user)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(inbox))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /notifications`.
#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub to:      Uid,
  pub from:    Uid,
  pub content: NotificationContent,
}

/// `POST /notifications` — returns 201 + the stored notification.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: NotificationStore,
{
  // Deserialisation bypasses the validating constructors; re-check here.
  body.content.validate()?;
  let notification = Notification::send(body.to, body.from, body.content);
  store
    .push(&notification)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(notification)))
}

// ─── Mark read ────────────────────────────────────────────────────────────────

/// `POST /notifications/:id/read`
pub async fn mark_read<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: NotificationStore,
{
  store
    .mark_read(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}
