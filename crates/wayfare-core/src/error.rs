//! Error types for `wayfare-core`.
//!
//! Construction-time invariant violations each get their own variant so a
//! caller (and a test) can tell exactly which rule failed first.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  // ── Identifier format ─────────────────────────────────────────────────
  #[error("identifier must be exactly 20 characters, got {0}")]
  BadUidLength(usize),

  #[error("identifier must be ASCII alphanumeric: {0:?}")]
  BadUidCharacter(String),

  // ── Travel aggregate invariants ───────────────────────────────────────
  #[error("travel title must not be blank")]
  BlankTitle,

  #[error("travel start {start} is not strictly before end {end}")]
  InvertedTimeRange {
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  },

  #[error("a travel must have at least one participant")]
  NoParticipants,

  #[error("a travel must have at least one owner")]
  NoOwner,

  // ── Location invariants ───────────────────────────────────────────────
  #[error("latitude {0} is outside [-90, 90]")]
  LatitudeOutOfRange(f64),

  #[error("longitude {0} is outside [-180, 180]")]
  LongitudeOutOfRange(f64),

  #[error("location name must not be blank")]
  BlankLocationName,

  // ── Notification invariants ───────────────────────────────────────────
  #[error("notification text must not be blank")]
  BlankNotificationText,

  // ── Document conversion ───────────────────────────────────────────────
  #[error("document field {0:?} is missing")]
  MissingField(&'static str),

  #[error("document field {0:?} has the wrong type")]
  BadField(&'static str),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown event kind: {0:?}")]
  UnknownEventKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
