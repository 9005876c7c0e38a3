//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use wayfare_core::{
  event::EventKind,
  location::Location,
  notification::{Notification, NotificationContent},
  participant::{Participant, Role},
  profile::Profile,
  store::{NotificationStore, TravelStore, UpdateMode},
  travel::Travel,
  uid::Uid,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn uid(tag: u8) -> Uid {
  let mut s = String::from("u");
  s.push((b'0' + tag) as char);
  s.push_str("AAAAAAAAAAAAAAAAAA");
  Uid::parse(s).unwrap()
}

fn profile(tag: u8, email: &str) -> Profile {
  Profile {
    uid:              uid(tag),
    username:         format!("user{tag}"),
    email:            email.to_owned(),
    name:             format!("User {tag}"),
    friends:          vec![],
    travels:          vec![],
    needs_onboarding: false,
  }
}

fn travel(travel_tag: u8, roster: &[(u8, Role)]) -> Travel {
  let mut s = String::from("t");
  s.push((b'0' + travel_tag) as char);
  s.push_str("BBBBBBBBBBBBBBBBBB");
  let participants: BTreeMap<Participant, Role> = roster
    .iter()
    .map(|(tag, role)| (Participant::new(uid(*tag)), *role))
    .collect();
  Travel::new(
    Uid::parse(s).unwrap(),
    "Summer in Portugal",
    "Two weeks along the coast",
    Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
    Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap(),
    Location::new(38.7223, -9.1393, Utc::now(), "Lisbon").unwrap(),
    BTreeMap::new(),
    participants,
  )
  .unwrap()
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_travel_persists_doc_profile_and_journal() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner)]);
  s.add_travel(&t).await.unwrap();

  let fetched = s.get_travel(t.uid()).await.unwrap().unwrap();
  assert_eq!(fetched, t);

  let owner = s.get_profile(&uid(1)).await.unwrap().unwrap();
  assert!(owner.contains_travel(t.uid()));

  let events = s.events_for_travel(t.uid()).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, EventKind::StartOfJourney);
  assert_eq!(events[0].travel, *t.uid());
}

#[tokio::test]
async fn add_travel_with_missing_profile_persists_nothing() {
  let s = store().await;
  // u1 has a profile, u2 does not: the second attach step fails and the
  // whole transaction must unwind.
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner), (2, Role::Participant)]);
  let err = s.add_travel(&t).await.unwrap_err();
  assert!(matches!(err, Error::ProfileNotFound(u) if u == uid(2)));

  assert!(s.get_travel(t.uid()).await.unwrap().is_none());
  let u1 = s.get_profile(&uid(1)).await.unwrap().unwrap();
  assert!(u1.travels.is_empty());
  assert!(s.events_for_travel(t.uid()).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_travel_twice_errors() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner)]);
  s.add_travel(&t).await.unwrap();
  let err = s.add_travel(&t).await.unwrap_err();
  assert!(matches!(err, Error::TravelExists(_)));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_travel_missing_returns_none() {
  let s = store().await;
  assert!(s.get_travel(&uid(9)).await.unwrap().is_none());
}

#[tokio::test]
async fn get_travel_corrupted_is_an_explicit_error() {
  let s = store().await;
  let bad_uid = uid(8);
  let bad_uid_str = bad_uid.to_string();
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO travels (uid, doc, participant_uids) VALUES (?1, '{\"title\": 3}', '[]')",
        rusqlite::params![bad_uid_str],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.get_travel(&bad_uid).await.unwrap_err();
  assert!(matches!(err, Error::Corrupted { travel, .. } if travel == bad_uid));
}

#[tokio::test]
async fn travels_for_user_filters_by_membership() {
  let s = store().await;
  for (tag, email) in [(1, "a@x.com"), (2, "b@x.com"), (3, "c@x.com")] {
    s.upsert_profile(&profile(tag, email)).await.unwrap();
  }

  let t1 = travel(1, &[(1, Role::Owner), (2, Role::Participant)]);
  let t2 = travel(2, &[(2, Role::Owner)]);
  let t3 = travel(3, &[(3, Role::Owner)]);
  for t in [&t1, &t2, &t3] {
    s.add_travel(t).await.unwrap();
  }

  let for_u2 = s.travels_for_user(&uid(2)).await.unwrap();
  let mut uids: Vec<_> = for_u2.iter().map(|t| t.uid().clone()).collect();
  uids.sort();
  assert_eq!(uids, vec![t1.uid().clone(), t2.uid().clone()]);

  assert!(s.travels_for_user(&uid(9)).await.unwrap().is_empty());
}

#[tokio::test]
async fn travels_for_user_skips_unconvertible_documents() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();

  let good = travel(1, &[(1, Role::Owner)]);
  s.add_travel(&good).await.unwrap();

  // A stored row whose doc is malformed but whose membership mirror still
  // matches the query must be skipped, not fail the listing.
  let member = format!("[\"{}\"]", uid(1));
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO travels (uid, doc, participant_uids) VALUES ('t9BBBBBBBBBBBBBBBBBB', '{}', ?1)",
        rusqlite::params![member],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let listed = s.travels_for_user(&uid(1)).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].uid(), good.uid());
}

// ─── Fields update ───────────────────────────────────────────────────────────

#[tokio::test]
async fn fields_update_overwrites_without_journaling() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner)]);
  s.add_travel(&t).await.unwrap();

  let renamed = Travel::new(
    t.uid().clone(),
    "Autumn in Portugal",
    t.description(),
    t.start(),
    t.end(),
    t.location().clone(),
    t.attachments().clone(),
    t.participants().clone(),
  )
  .unwrap();
  s.update_travel(&renamed, UpdateMode::FieldsUpdate).await.unwrap();

  let fetched = s.get_travel(t.uid()).await.unwrap().unwrap();
  assert_eq!(fetched.title(), "Autumn in Portugal");

  // Only the creation event exists.
  let events = s.events_for_travel(t.uid()).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, EventKind::StartOfJourney);
}

#[tokio::test]
async fn updating_a_missing_travel_errors() {
  let s = store().await;
  let t = travel(7, &[(1, Role::Owner)]);
  let err = s.update_travel(&t, UpdateMode::FieldsUpdate).await.unwrap_err();
  assert!(matches!(err, Error::TravelNotFound(_)));
}

// ─── Membership transactions ─────────────────────────────────────────────────

#[tokio::test]
async fn add_participant_updates_all_three_views() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();
  s.upsert_profile(&profile(2, "u2@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner)]);
  s.add_travel(&t).await.unwrap();

  let joined = t.with_participant(uid(2), Role::Participant).unwrap();
  s.update_travel(&joined, UpdateMode::AddParticipant { user: uid(2) })
    .await
    .unwrap();

  // Roster view.
  let fetched = s.get_travel(t.uid()).await.unwrap().unwrap();
  assert_eq!(fetched.role_of(&uid(2)), Some(Role::Participant));
  assert_eq!(fetched.participant_uids(), vec![uid(1), uid(2)]);

  // Profile view.
  let u2 = s.get_profile(&uid(2)).await.unwrap().unwrap();
  assert!(u2.contains_travel(t.uid()));

  // Journal view: exactly one new-participant entry, referencing the email.
  let events = s.events_for_travel(t.uid()).await.unwrap();
  let joins: Vec<_> = events
    .iter()
    .filter(|e| e.kind == EventKind::NewParticipant)
    .collect();
  assert_eq!(joins.len(), 1);
  assert!(joins[0].description.contains("u2@example.com"));
}

#[tokio::test]
async fn add_participant_with_missing_profile_persists_nothing() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner)]);
  s.add_travel(&t).await.unwrap();

  // u2 has no profile: the transaction must unwind, including the travel
  // document overwrite that ran before the failing step.
  let joined = t.with_participant(uid(2), Role::Participant).unwrap();
  let err = s
    .update_travel(&joined, UpdateMode::AddParticipant { user: uid(2) })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProfileNotFound(u) if u == uid(2)));

  let fetched = s.get_travel(t.uid()).await.unwrap().unwrap();
  assert_eq!(fetched.role_of(&uid(2)), None);
  assert_eq!(fetched.participant_uids(), vec![uid(1)]);

  let events = s.events_for_travel(t.uid()).await.unwrap();
  assert!(events.iter().all(|e| e.kind != EventKind::NewParticipant));
}

#[tokio::test]
async fn remove_participant_updates_all_three_views() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();
  s.upsert_profile(&profile(2, "u2@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner), (2, Role::Participant)]);
  s.add_travel(&t).await.unwrap();

  let shrunk = t.without_participant(&uid(2)).unwrap();
  s.update_travel(&shrunk, UpdateMode::RemoveParticipant { user: uid(2) })
    .await
    .unwrap();

  let fetched = s.get_travel(t.uid()).await.unwrap().unwrap();
  assert_eq!(fetched.role_of(&uid(2)), None);

  let u2 = s.get_profile(&uid(2)).await.unwrap().unwrap();
  assert!(!u2.contains_travel(t.uid()));

  let events = s.events_for_travel(t.uid()).await.unwrap();
  let removals: Vec<_> = events
    .iter()
    .filter(|e| e.kind == EventKind::ParticipantRemoved)
    .collect();
  assert_eq!(removals.len(), 1);
  assert!(removals[0].description.contains("u2@example.com"));
}

// ─── Delete cascade ──────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_travel_detaches_every_participant() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();
  s.upsert_profile(&profile(2, "u2@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner), (2, Role::Participant)]);
  s.add_travel(&t).await.unwrap();

  s.delete_travel(t.uid()).await.unwrap();

  assert!(s.get_travel(t.uid()).await.unwrap().is_none());
  for tag in [1, 2] {
    let p = s.get_profile(&uid(tag)).await.unwrap().unwrap();
    assert!(!p.contains_travel(t.uid()), "u{tag} still attached");
  }
  assert!(s.events_for_travel(t.uid()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_travel_survives_an_already_deleted_profile() {
  let s = store().await;
  s.upsert_profile(&profile(1, "u1@example.com")).await.unwrap();
  s.upsert_profile(&profile(2, "u2@example.com")).await.unwrap();

  let t = travel(1, &[(1, Role::Owner), (2, Role::Participant)]);
  s.add_travel(&t).await.unwrap();

  // u2's profile disappears out from under the travel.
  let gone = uid(2).to_string();
  s.conn
    .call(move |conn| {
      conn.execute("DELETE FROM profiles WHERE uid = ?1", rusqlite::params![gone])?;
      Ok(())
    })
    .await
    .unwrap();

  s.delete_travel(t.uid()).await.unwrap();
  assert!(s.get_travel(t.uid()).await.unwrap().is_none());
  let u1 = s.get_profile(&uid(1)).await.unwrap().unwrap();
  assert!(!u1.contains_travel(t.uid()));
}

#[tokio::test]
async fn delete_missing_travel_errors() {
  let s = store().await;
  let err = s.delete_travel(&uid(9)).await.unwrap_err();
  assert!(matches!(err, Error::TravelNotFound(_)));
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_round_trips() {
  let s = store().await;
  let mut p = profile(1, "alice@example.com");
  p.friends = vec![uid(2), uid(3)];
  p.needs_onboarding = true;
  s.upsert_profile(&p).await.unwrap();

  let fetched = s.get_profile(&uid(1)).await.unwrap().unwrap();
  assert_eq!(fetched, p);
}

#[tokio::test]
async fn profile_by_email_finds_a_unique_match() {
  let s = store().await;
  s.upsert_profile(&profile(1, "alice@example.com")).await.unwrap();
  s.upsert_profile(&profile(2, "bob@example.com")).await.unwrap();

  let found = s.profile_by_email("bob@example.com").await.unwrap().unwrap();
  assert_eq!(found.uid, uid(2));
}

#[tokio::test]
async fn profile_by_email_missing_is_none() {
  let s = store().await;
  assert!(s.profile_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn profile_by_email_ambiguous_is_none_not_an_error() {
  let s = store().await;
  s.upsert_profile(&profile(1, "shared@example.com")).await.unwrap();
  s.upsert_profile(&profile(2, "shared@example.com")).await.unwrap();

  let result = s.profile_by_email("shared@example.com").await.unwrap();
  assert!(result.is_none());
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_round_trip_newest_first() {
  let s = store().await;

  let mut older = Notification::send(
    uid(1),
    uid(2),
    NotificationContent::friend_invitation("Bob").unwrap(),
  );
  older.at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
  let mut newer = Notification::send(
    uid(1),
    uid(3),
    NotificationContent::reminder(uid(9), "Pack your bags").unwrap(),
  );
  newer.at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

  s.push(&older).await.unwrap();
  s.push(&newer).await.unwrap();

  let inbox = s.notifications_for_user(&uid(1)).await.unwrap();
  assert_eq!(inbox.len(), 2);
  assert_eq!(inbox[0], newer);
  assert_eq!(inbox[1], older);

  // Addressed to someone else: empty inbox.
  assert!(s.notifications_for_user(&uid(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_read_flips_the_flag() {
  let s = store().await;
  let n = Notification::send(
    uid(1),
    uid(2),
    NotificationContent::friend_invitation("Bob").unwrap(),
  );
  s.push(&n).await.unwrap();

  s.mark_read(&n.id).await.unwrap();
  let inbox = s.notifications_for_user(&uid(1)).await.unwrap();
  assert!(inbox[0].read);
}

#[tokio::test]
async fn mark_read_missing_errors() {
  let s = store().await;
  let err = s.mark_read(&uuid::Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NotificationNotFound(_)));
}
