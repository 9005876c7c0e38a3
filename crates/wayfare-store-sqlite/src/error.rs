//! Error type for `wayfare-store-sqlite`.

use thiserror::Error;
use wayfare_core::uid::Uid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] wayfare_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("travel not found: {0}")]
  TravelNotFound(Uid),

  #[error("a travel with id {0} already exists")]
  TravelExists(Uid),

  #[error("profile not found: {0}")]
  ProfileNotFound(Uid),

  #[error("notification not found: {0}")]
  NotificationNotFound(uuid::Uuid),

  /// A single-document read hit a stored travel that no longer converts.
  #[error("stored travel document {travel} is corrupted: {reason}")]
  Corrupted { travel: Uid, reason: String },

  /// A stored profile's travel list no longer parses.
  #[error("stored profile {0} is corrupted")]
  CorruptedProfile(Uid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
