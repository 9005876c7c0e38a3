//! `Travel` — the aggregate root.
//!
//! All invariants are checked at construction, in a fixed order, failing on
//! the first violated rule. Mutation happens by whole-value rebuild through
//! [`Travel::new`], so a `Travel` in hand is always valid.
//!
//! The flat participant-id list used for membership queries is derived from
//! the roster map on every read and serialisation — never stored as
//! independently-mutable state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{
  Error, Result,
  location::Location,
  participant::{Participant, Role},
  uid::Uid,
};

/// One trip: identity, descriptive fields, a time range, a location, named
/// attachments (attachment name → external document id), and the
/// participant roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Travel {
  uid:          Uid,
  title:        String,
  description:  String,
  start:        DateTime<Utc>,
  end:          DateTime<Utc>,
  location:     Location,
  attachments:  BTreeMap<String, String>,
  participants: BTreeMap<Participant, Role>,
}

impl Travel {
  /// Validates, in order: `title` non-blank → `start < end` → roster
  /// non-empty → at least one [`Role::Owner`]. (`uid` and `location` carry
  /// their own validity in their types.) Fails on the first violated rule;
  /// no side effects.
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    uid: Uid,
    title: impl Into<String>,
    description: impl Into<String>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    location: Location,
    attachments: BTreeMap<String, String>,
    participants: BTreeMap<Participant, Role>,
  ) -> Result<Self> {
    let title = title.into();
    if title.trim().is_empty() {
      return Err(Error::BlankTitle);
    }
    if start >= end {
      return Err(Error::InvertedTimeRange { start, end });
    }
    if participants.is_empty() {
      return Err(Error::NoParticipants);
    }
    if !participants.values().any(|r| *r == Role::Owner) {
      return Err(Error::NoOwner);
    }
    Ok(Self {
      uid,
      title,
      description: description.into(),
      start,
      end,
      location,
      attachments,
      participants,
    })
  }

  pub fn uid(&self) -> &Uid { &self.uid }

  pub fn title(&self) -> &str { &self.title }

  pub fn description(&self) -> &str { &self.description }

  pub fn start(&self) -> DateTime<Utc> { self.start }

  pub fn end(&self) -> DateTime<Utc> { self.end }

  pub fn location(&self) -> &Location { &self.location }

  pub fn attachments(&self) -> &BTreeMap<String, String> { &self.attachments }

  pub fn participants(&self) -> &BTreeMap<Participant, Role> {
    &self.participants
  }

  /// The flat participant-id list, derived from the roster keys (sorted).
  /// This is what membership queries filter on.
  pub fn participant_uids(&self) -> Vec<Uid> {
    self.participants.keys().map(|p| p.uid().clone()).collect()
  }

  pub fn role_of(&self, uid: &Uid) -> Option<Role> {
    self.participants.get(&Participant::new(uid.clone())).copied()
  }

  // ── Roster rebuilds ───────────────────────────────────────────────────

  /// A copy of this travel with `uid` present in the roster at `role`.
  /// Re-runs all aggregate invariants.
  pub fn with_participant(&self, uid: Uid, role: Role) -> Result<Self> {
    let mut participants = self.participants.clone();
    participants.insert(Participant::new(uid), role);
    Self::new(
      self.uid.clone(),
      self.title.clone(),
      self.description.clone(),
      self.start,
      self.end,
      self.location.clone(),
      self.attachments.clone(),
      participants,
    )
  }

  /// A copy of this travel with `uid` removed from the roster. Removing the
  /// last participant or the last owner fails with the corresponding
  /// invariant error.
  pub fn without_participant(&self, uid: &Uid) -> Result<Self> {
    let mut participants = self.participants.clone();
    participants.remove(&Participant::new(uid.clone()));
    Self::new(
      self.uid.clone(),
      self.title.clone(),
      self.description.clone(),
      self.start,
      self.end,
      self.location.clone(),
      self.attachments.clone(),
      participants,
    )
  }

  // ── Document codec ────────────────────────────────────────────────────

  /// Serialise to the string-keyed transport map stored as the travel
  /// document. The roster flattens to `{uid: role}`, the location to its
  /// own nested map, and the derived flat uid list is written alongside.
  /// Pure: two calls on the same value yield identical maps.
  pub fn to_doc(&self) -> Map<String, Value> {
    let participants: Map<String, Value> = self
      .participants
      .iter()
      .map(|(p, role)| (p.uid().to_string(), json!(role.to_string())))
      .collect();

    let attachments: Map<String, Value> = self
      .attachments
      .iter()
      .map(|(name, doc_id)| (name.clone(), json!(doc_id)))
      .collect();

    let mut doc = Map::new();
    doc.insert("title".into(), json!(self.title));
    doc.insert("description".into(), json!(self.description));
    doc.insert("start".into(), json!(self.start.to_rfc3339()));
    doc.insert("end".into(), json!(self.end.to_rfc3339()));
    doc.insert(
      "location".into(),
      json!({
        "latitude":    self.location.latitude(),
        "longitude":   self.location.longitude(),
        "recorded_at": self.location.recorded_at().to_rfc3339(),
        "name":        self.location.name(),
      }),
    );
    doc.insert("attachments".into(), Value::Object(attachments));
    doc.insert("participants".into(), Value::Object(participants));
    doc.insert(
      "participant_uids".into(),
      json!(self.participant_uids()),
    );
    doc
  }

  /// Reconstruct a travel from its transport map. The exact inverse of
  /// [`Travel::to_doc`].
  ///
  /// Any missing or mistyped required field fails the whole conversion —
  /// never a partially-populated value. Missing location numerics default
  /// leniently; a missing location name is strict and fails. The stored
  /// flat uid list is ignored in favour of the roster map.
  pub fn from_doc(uid: Uid, doc: &Map<String, Value>) -> Result<Self> {
    let title = req_str(doc, "title")?;
    let description = req_str(doc, "description")?;
    let start = req_datetime(doc, "start")?;
    let end = req_datetime(doc, "end")?;

    let loc = req_obj(doc, "location")?;
    let latitude = lenient_f64(loc, "latitude")?;
    let longitude = lenient_f64(loc, "longitude")?;
    let recorded_at = match loc.get("recorded_at") {
      None => DateTime::<Utc>::UNIX_EPOCH,
      Some(_) => req_datetime(loc, "recorded_at")?,
    };
    let name = match loc.get("name") {
      None => return Err(Error::MissingField("location.name")),
      Some(v) => v.as_str().ok_or(Error::BadField("location.name"))?,
    };
    let location = Location::new(latitude, longitude, recorded_at, name)?;

    let attachments = req_obj(doc, "attachments")?
      .iter()
      .map(|(k, v)| {
        let doc_id = v.as_str().ok_or(Error::BadField("attachments"))?;
        Ok((k.clone(), doc_id.to_owned()))
      })
      .collect::<Result<BTreeMap<_, _>>>()?;

    let participants = req_obj(doc, "participants")?
      .iter()
      .map(|(k, v)| {
        let member = Participant::new(Uid::parse(k.as_str())?);
        let role_str = v.as_str().ok_or(Error::BadField("participants"))?;
        let role = role_str
          .parse::<Role>()
          .map_err(|_| Error::UnknownRole(role_str.to_owned()))?;
        Ok((member, role))
      })
      .collect::<Result<BTreeMap<_, _>>>()?;

    Self::new(
      uid,
      title,
      description,
      start,
      end,
      location,
      attachments,
      participants,
    )
  }
}

// ─── Field extraction ────────────────────────────────────────────────────────

fn req_str<'a>(doc: &'a Map<String, Value>, key: &'static str) -> Result<&'a str> {
  doc
    .get(key)
    .ok_or(Error::MissingField(key))?
    .as_str()
    .ok_or(Error::BadField(key))
}

fn req_obj<'a>(
  doc: &'a Map<String, Value>,
  key: &'static str,
) -> Result<&'a Map<String, Value>> {
  doc
    .get(key)
    .ok_or(Error::MissingField(key))?
    .as_object()
    .ok_or(Error::BadField(key))
}

fn req_datetime(doc: &Map<String, Value>, key: &'static str) -> Result<DateTime<Utc>> {
  let raw = req_str(doc, key)?;
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|_| Error::BadField(key))
}

/// Absent numeric fields default to `0.0`; present non-numbers are a
/// conversion failure.
fn lenient_f64(doc: &Map<String, Value>, key: &'static str) -> Result<f64> {
  match doc.get(key) {
    None => Ok(0.0),
    Some(v) => v.as_f64().ok_or(Error::BadField(key)),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn uid(tag: u8) -> Uid {
    let mut s = String::from("u");
    s.push((b'0' + tag) as char);
    s.push_str("AAAAAAAAAAAAAAAAAA");
    Uid::parse(s).unwrap()
  }

  fn location() -> Location {
    Location::new(
      38.7223,
      -9.1393,
      Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
      "Lisbon",
    )
    .unwrap()
  }

  fn roster(entries: &[(u8, Role)]) -> BTreeMap<Participant, Role> {
    entries
      .iter()
      .map(|(tag, role)| (Participant::new(uid(*tag)), *role))
      .collect()
  }

  fn travel() -> Travel {
    Travel::new(
      uid(9),
      "Summer in Portugal",
      "Two weeks along the coast",
      Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
      Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap(),
      location(),
      BTreeMap::from([("tickets".to_owned(), "doc123".to_owned())]),
      roster(&[(1, Role::Owner), (2, Role::Participant)]),
    )
    .unwrap()
  }

  // ── Invariants ──────────────────────────────────────────────────────────

  #[test]
  fn valid_travel_constructs() {
    let t = travel();
    assert_eq!(t.title(), "Summer in Portugal");
    assert_eq!(t.participants().len(), 2);
  }

  #[test]
  fn blank_title_is_rejected() {
    let err = Travel::new(
      uid(9),
      "   ",
      "",
      Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
      Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap(),
      location(),
      BTreeMap::new(),
      roster(&[(1, Role::Owner)]),
    )
    .unwrap_err();
    assert!(matches!(err, Error::BlankTitle));
  }

  #[test]
  fn inverted_time_range_is_rejected() {
    let start = Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap();
    let err = Travel::new(
      uid(9),
      "T",
      "",
      start,
      start,
      location(),
      BTreeMap::new(),
      roster(&[(1, Role::Owner)]),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvertedTimeRange { .. }));
  }

  #[test]
  fn empty_roster_is_rejected() {
    let err = Travel::new(
      uid(9),
      "T",
      "",
      Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
      Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap(),
      location(),
      BTreeMap::new(),
      BTreeMap::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoParticipants));
  }

  #[test]
  fn ownerless_roster_is_rejected() {
    let err = Travel::new(
      uid(9),
      "T",
      "",
      Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
      Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap(),
      location(),
      BTreeMap::new(),
      roster(&[(1, Role::Organizer), (2, Role::Participant)]),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoOwner));
  }

  #[test]
  fn first_violated_rule_wins() {
    // Blank title AND empty roster: the title check runs first.
    let err = Travel::new(
      uid(9),
      "",
      "",
      Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap(),
      Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
      location(),
      BTreeMap::new(),
      BTreeMap::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::BlankTitle));
  }

  // ── Roster rebuilds ─────────────────────────────────────────────────────

  #[test]
  fn with_participant_adds_member() {
    let t = travel().with_participant(uid(3), Role::Organizer).unwrap();
    assert_eq!(t.role_of(&uid(3)), Some(Role::Organizer));
    assert_eq!(t.participant_uids(), vec![uid(1), uid(2), uid(3)]);
  }

  #[test]
  fn without_participant_removes_member() {
    let t = travel().without_participant(&uid(2)).unwrap();
    assert_eq!(t.role_of(&uid(2)), None);
    assert_eq!(t.participant_uids(), vec![uid(1)]);
  }

  #[test]
  fn removing_last_owner_is_rejected() {
    let err = travel().without_participant(&uid(1)).unwrap_err();
    assert!(matches!(err, Error::NoOwner));
  }

  #[test]
  fn removing_last_participant_is_rejected() {
    let t = travel().without_participant(&uid(2)).unwrap();
    let err = t.without_participant(&uid(1)).unwrap_err();
    assert!(matches!(err, Error::NoParticipants));
  }

  // ── Document codec ──────────────────────────────────────────────────────

  #[test]
  fn doc_round_trip_is_exact() {
    let t = travel();
    let back = Travel::from_doc(t.uid().clone(), &t.to_doc()).unwrap();
    assert_eq!(back, t);
  }

  #[test]
  fn to_doc_is_idempotent() {
    let t = travel();
    assert_eq!(t.to_doc(), t.to_doc());
  }

  #[test]
  fn missing_title_fails_conversion() {
    let mut doc = travel().to_doc();
    doc.remove("title");
    let err = Travel::from_doc(uid(9), &doc).unwrap_err();
    assert!(matches!(err, Error::MissingField("title")));
  }

  #[test]
  fn mistyped_start_fails_conversion() {
    let mut doc = travel().to_doc();
    doc.insert("start".into(), json!(42));
    let err = Travel::from_doc(uid(9), &doc).unwrap_err();
    assert!(matches!(err, Error::BadField("start")));
  }

  #[test]
  fn missing_location_numerics_default_to_zero() {
    let mut doc = travel().to_doc();
    let loc = doc["location"].as_object_mut().unwrap();
    loc.remove("latitude");
    loc.remove("longitude");
    let t = Travel::from_doc(uid(9), &doc).unwrap();
    assert_eq!(t.location().latitude(), 0.0);
    assert_eq!(t.location().longitude(), 0.0);
  }

  #[test]
  fn missing_location_name_fails_conversion() {
    let mut doc = travel().to_doc();
    doc["location"].as_object_mut().unwrap().remove("name");
    let err = Travel::from_doc(uid(9), &doc).unwrap_err();
    assert!(matches!(err, Error::MissingField("location.name")));
  }

  #[test]
  fn unknown_role_fails_conversion() {
    let mut doc = travel().to_doc();
    doc["participants"]
      .as_object_mut()
      .unwrap()
      .insert(uid(1).to_string(), json!("superuser"));
    let err = Travel::from_doc(uid(9), &doc).unwrap_err();
    assert!(matches!(err, Error::UnknownRole(_)));
  }

  #[test]
  fn empty_roster_in_doc_fails_conversion() {
    let mut doc = travel().to_doc();
    doc.insert("participants".into(), json!({}));
    let err = Travel::from_doc(uid(9), &doc).unwrap_err();
    assert!(matches!(err, Error::NoParticipants));
  }

  #[test]
  fn stored_flat_list_is_ignored_in_favour_of_roster() {
    let mut doc = travel().to_doc();
    // A drifted flat list must not leak into the reconstructed value.
    doc.insert("participant_uids".into(), json!([uid(7).to_string()]));
    let t = Travel::from_doc(uid(9), &doc).unwrap();
    assert_eq!(t.participant_uids(), vec![uid(1), uid(2)]);
  }
}
