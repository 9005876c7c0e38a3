//! Handlers for `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profiles?email=<e>` | 200 with `null` on no/ambiguous match |
//! | `GET`  | `/profiles/:id` | 404 if not found |
//! | `PUT`  | `/profiles/:id` | Create or replace; the travel list is store-managed |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use wayfare_core::{profile::Profile, store::TravelStore, uid::Uid};

use crate::error::ApiError;

// ─── Lookup by email ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmailParams {
  pub email: String,
}

/// `GET /profiles?email=<e>`
///
/// A missing or ambiguous email is a successful `null`, not an error — the
/// caller treats both the same way.
pub async fn by_email<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<EmailParams>,
) -> Result<Json<Option<Profile>>, ApiError>
where
  S: TravelStore,
{
  let profile = store
    .profile_by_email(&params.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(profile))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /profiles/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uid>,
) -> Result<Json<Profile>, ApiError>
where
  S: TravelStore,
{
  let profile = store
    .get_profile(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(profile))
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /profiles/:id`. The travel list is absent on
/// purpose: only the store's travel transactions may touch it.
#[derive(Debug, Deserialize)]
pub struct ProfileBody {
  pub username:         String,
  pub email:            String,
  pub name:             String,
  #[serde(default)]
  pub friends:          Vec<Uid>,
  #[serde(default)]
  pub needs_onboarding: bool,
}

/// `PUT /profiles/:id`
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uid>,
  Json(body): Json<ProfileBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: TravelStore,
{
  // Preserve the store-managed travel list across replacement.
  let travels = store
    .get_profile(&id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .map(|p| p.travels)
    .unwrap_or_default();

  let profile = Profile {
    uid: id,
    username: body.username,
    email: body.email,
    name: body.name,
    friends: body.friends,
    travels,
    needs_onboarding: body.needs_onboarding,
  };
  store
    .upsert_profile(&profile)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(profile))
}
