//! Journal events — the append-only audit trail of a travel.
//!
//! An event is written as a side effect of travel creation and of
//! membership changes, inside the same transaction as the mutation it
//! records. Once written it is never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::uid::Uid;

/// What a journal entry records.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
  StartOfJourney,
  NewParticipant,
  ParticipantRemoved,
  NewDocument,
  Other,
}

/// One append-only journal entry attached to a travel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id:          Uuid,
  pub travel:      Uid,
  pub kind:        EventKind,
  pub at:          DateTime<Utc>,
  pub title:       String,
  pub description: String,
}

impl Event {
  /// Build a fresh entry stamped now with a server-generated id.
  pub fn record(
    travel: Uid,
    kind: EventKind,
    title: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      travel,
      kind,
      at: Utc::now(),
      title: title.into(),
      description: description.into(),
    }
  }
}
