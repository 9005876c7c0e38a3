//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Travel documents and
//! list-valued columns are stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use wayfare_core::{
  event::{Event, EventKind},
  notification::{Notification, NotificationContent},
  profile::Profile,
  travel::Travel,
  uid::Uid,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_uid(s: &str) -> Result<Uid> { Ok(Uid::parse(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_uid_list(uids: &[Uid]) -> Result<String> {
  Ok(serde_json::to_string(uids)?)
}

pub fn decode_uid_list(s: &str) -> Result<Vec<Uid>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `travels` row.
pub struct RawTravel {
  pub uid: String,
  pub doc: String,
}

impl RawTravel {
  pub fn into_travel(self) -> Result<Travel> {
    let uid = decode_uid(&self.uid)?;
    let doc: serde_json::Map<String, serde_json::Value> =
      serde_json::from_str(&self.doc)?;
    Ok(Travel::from_doc(uid, &doc)?)
  }
}

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub uid:              String,
  pub username:         String,
  pub email:            String,
  pub name:             String,
  pub friends:          String,
  pub travels:          String,
  pub needs_onboarding: bool,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      uid:              decode_uid(&self.uid)?,
      username:         self.username,
      email:            self.email,
      name:             self.name,
      friends:          decode_uid_list(&self.friends)?,
      travels:          decode_uid_list(&self.travels)?,
      needs_onboarding: self.needs_onboarding,
    })
  }
}

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub event_id:    String,
  pub travel_uid:  String,
  pub kind:        String,
  pub at:          String,
  pub title:       String,
  pub description: String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    let kind = self
      .kind
      .parse::<EventKind>()
      .map_err(|_| wayfare_core::Error::UnknownEventKind(self.kind.clone()))?;
    Ok(Event {
      id: decode_uuid(&self.event_id)?,
      travel: decode_uid(&self.travel_uid)?,
      kind,
      at: decode_dt(&self.at)?,
      title: self.title,
      description: self.description,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub to_uid:          String,
  pub from_uid:        String,
  pub at:              String,
  pub is_read:         bool,
  pub content:         String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    let content: NotificationContent = serde_json::from_str(&self.content)?;
    Ok(Notification {
      id: decode_uuid(&self.notification_id)?,
      to: decode_uid(&self.to_uid)?,
      from: decode_uid(&self.from_uid)?,
      at: decode_dt(&self.at)?,
      read: self.is_read,
      content,
    })
  }
}
