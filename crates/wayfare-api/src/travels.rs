//! Handlers for `/travels` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/travels` | `?user=<uid>` required |
//! | `POST`   | `/travels` | Body: [`TravelBody`]; returns 201 + stored travel |
//! | `GET`    | `/travels/:id` | 404 if not found |
//! | `PUT`    | `/travels/:id` | Whole-document fields update |
//! | `DELETE` | `/travels/:id` | Cascades through every participant profile |
//! | `POST`   | `/travels/:id/participants` | Body: `{"user": <uid>, "role": "participant"}` |
//! | `DELETE` | `/travels/:id/participants/:uid` | |
//! | `GET`    | `/travels/:id/events` | The travel's journal, oldest first |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use wayfare_core::{
  event::Event,
  location::Location,
  participant::{Participant, Role},
  store::{TravelStore, UpdateMode},
  travel::Travel,
  uid::Uid,
};

use crate::error::ApiError;

// ─── Bodies ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LocationBody {
  pub latitude:    f64,
  pub longitude:   f64,
  /// Defaults to now when omitted.
  pub recorded_at: Option<DateTime<Utc>>,
  pub name:        String,
}

/// JSON body accepted by `POST /travels` and `PUT /travels/:id`.
#[derive(Debug, Deserialize)]
pub struct TravelBody {
  /// Server-generated when omitted on create; ignored on update in favour
  /// of the path id.
  pub uid:          Option<Uid>,
  pub title:        String,
  #[serde(default)]
  pub description:  String,
  pub start:        DateTime<Utc>,
  pub end:          DateTime<Utc>,
  pub location:     LocationBody,
  #[serde(default)]
  pub attachments:  BTreeMap<String, String>,
  pub participants: BTreeMap<Uid, Role>,
}

impl TravelBody {
  fn into_travel(self, uid: Uid) -> wayfare_core::Result<Travel> {
    let location = Location::new(
      self.location.latitude,
      self.location.longitude,
      self.location.recorded_at.unwrap_or_else(Utc::now),
      self.location.name,
    )?;
    let participants = self
      .participants
      .into_iter()
      .map(|(user, role)| (Participant::new(user), role))
      .collect();
    Travel::new(
      uid,
      self.title,
      self.description,
      self.start,
      self.end,
      location,
      self.attachments,
      participants,
    )
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user: Uid,
}

/// `GET /travels?user=<uid>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Travel>>, ApiError>
where
  S: TravelStore,
{
  let travels = store
    .travels_for_user(&params.user)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(travels))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /travels` — returns 201 + the stored travel.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<TravelBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TravelStore,
{
  let uid = body.uid.clone().unwrap_or_else(|| store.new_uid());
  let travel = body.into_travel(uid)?;
  store
    .add_travel(&travel)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(travel)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /travels/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uid>,
) -> Result<Json<Travel>, ApiError>
where
  S: TravelStore,
{
  let travel = fetch_travel(&*store, &id).await?;
  Ok(Json(travel))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /travels/:id` — whole-document fields update; no journal entry.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uid>,
  Json(body): Json<TravelBody>,
) -> Result<Json<Travel>, ApiError>
where
  S: TravelStore,
{
  // 404 before 400: the resource must exist before its new value matters.
  fetch_travel(&*store, &id).await?;
  let travel = body.into_travel(id)?;
  store
    .update_travel(&travel, UpdateMode::FieldsUpdate)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(travel))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /travels/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TravelStore,
{
  fetch_travel(&*store, &id).await?;
  store
    .delete_travel(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Membership ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddParticipantBody {
  pub user: Uid,
  /// Defaults to [`Role::Participant`].
  pub role: Option<Role>,
}

/// `POST /travels/:id/participants` — transactionally add a member.
pub async fn add_participant<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uid>,
  Json(body): Json<AddParticipantBody>,
) -> Result<Json<Travel>, ApiError>
where
  S: TravelStore,
{
  let travel = fetch_travel(&*store, &id).await?;
  let updated = travel
    .with_participant(body.user.clone(), body.role.unwrap_or(Role::Participant))?;
  store
    .update_travel(&updated, UpdateMode::AddParticipant { user: body.user })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(updated))
}

/// `DELETE /travels/:id/participants/:uid` — transactionally remove a member.
pub async fn remove_participant<S>(
  State(store): State<Arc<S>>,
  Path((id, user)): Path<(Uid, Uid)>,
) -> Result<Json<Travel>, ApiError>
where
  S: TravelStore,
{
  let travel = fetch_travel(&*store, &id).await?;
  let updated = travel.without_participant(&user)?;
  store
    .update_travel(&updated, UpdateMode::RemoveParticipant { user })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(updated))
}

// ─── Journal ──────────────────────────────────────────────────────────────────

/// `GET /travels/:id/events`
pub async fn events<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uid>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: TravelStore,
{
  fetch_travel(&*store, &id).await?;
  let events = store
    .events_for_travel(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(events))
}

// ─── Shared ───────────────────────────────────────────────────────────────────

async fn fetch_travel<S>(store: &S, id: &Uid) -> Result<Travel, ApiError>
where
  S: TravelStore,
{
  store
    .get_travel(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("travel {id} not found")))
}
