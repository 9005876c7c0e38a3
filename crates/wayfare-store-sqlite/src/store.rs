//! [`SqliteStore`] — the SQLite implementation of [`TravelStore`] and
//! [`NotificationStore`].
//!
//! Membership mutations keep three denormalised views consistent — the
//! travel document's roster, each affected profile's travel list, and the
//! journal — so each one runs as a single SQLite transaction: either every
//! write lands or the transaction unwinds and the causing error surfaces.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use wayfare_core::{
  event::{Event, EventKind},
  notification::Notification,
  profile::Profile,
  store::{NotificationStore, TravelStore, UpdateMode},
  travel::Travel,
  uid::Uid,
};

use crate::{
  Error, Result,
  encode::{
    RawEvent, RawNotification, RawProfile, RawTravel, encode_dt, encode_uuid,
    encode_uid_list,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Wayfare store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Overwrite the travel document and its membership mirror in place.
  async fn overwrite_doc(&self, travel: &Travel) -> Result<()> {
    let uid_str = travel.uid().to_string();
    let doc_str = serde_json::Value::Object(travel.to_doc()).to_string();
    let flat_json = encode_uid_list(&travel.participant_uids())?;

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE travels SET doc = ?2, participant_uids = ?3 WHERE uid = ?1",
          rusqlite::params![uid_str, doc_str, flat_json],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::TravelNotFound(travel.uid().clone()));
    }
    Ok(())
  }

  /// The `AddParticipant` / `RemoveParticipant` transaction: overwrite the
  /// travel document (the caller has already updated the roster), adjust
  /// the affected profile's travel list, and journal the change.
  async fn membership_update(
    &self,
    travel: &Travel,
    user: &Uid,
    adding: bool,
  ) -> Result<()> {
    let uid_str = travel.uid().to_string();
    let user_str = user.to_string();
    let doc_str = serde_json::Value::Object(travel.to_doc()).to_string();
    let flat_json = encode_uid_list(&travel.participant_uids())?;
    let title = travel.title().to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let updated = tx.execute(
          "UPDATE travels SET doc = ?2, participant_uids = ?3 WHERE uid = ?1",
          rusqlite::params![uid_str, doc_str, flat_json],
        )?;
        if updated == 0 {
          return Ok(Err(TxFail::MissingTravel));
        }

        let Some(email) = profile_email(&tx, &user_str)? else {
          return Ok(Err(TxFail::MissingProfile(user_str.clone())));
        };

        let step = if adding {
          attach_travel(&tx, &user_str, &uid_str)?
        } else {
          detach_travel(&tx, &user_str, &uid_str)?
        };
        if let Err(fail) = step {
          return Ok(Err(fail));
        }

        if adding {
          insert_event(
            &tx,
            &uid_str,
            EventKind::NewParticipant,
            "New participant",
            &format!("{email} joined \"{title}\""),
          )?;
        } else {
          insert_event(
            &tx,
            &uid_str,
            EventKind::ParticipantRemoved,
            "Participant removed",
            &format!("{email} left \"{title}\""),
          )?;
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome.map_err(|fail| fail.into_error(travel.uid()))
  }
}

// ─── TravelStore impl ────────────────────────────────────────────────────────

impl TravelStore for SqliteStore {
  type Error = Error;

  fn new_uid(&self) -> Uid { Uid::generate() }

  // ── Reads ─────────────────────────────────────────────────────────────

  async fn travels_for_user(&self, user: &Uid) -> Result<Vec<Travel>> {
    // Member uids are stored quoted inside a JSON array, so a quoted LIKE
    // pattern matches exactly one fixed-width uid.
    let pattern = format!("%\"{user}\"%");

    let raws: Vec<RawTravel> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT uid, doc FROM travels WHERE participant_uids LIKE ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], |row| {
            Ok(RawTravel { uid: row.get(0)?, doc: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut travels = Vec::with_capacity(raws.len());
    for raw in raws {
      match raw.into_travel() {
        Ok(travel) => travels.push(travel),
        Err(e) => {
          tracing::warn!(error = %e, "skipping unconvertible travel document");
        }
      }
    }
    Ok(travels)
  }

  async fn get_travel(&self, id: &Uid) -> Result<Option<Travel>> {
    let uid_str = id.to_string();

    let raw: Option<RawTravel> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, doc FROM travels WHERE uid = ?1",
              rusqlite::params![uid_str],
              |row| Ok(RawTravel { uid: row.get(0)?, doc: row.get(1)? }),
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      None => Ok(None),
      Some(raw) => raw.into_travel().map(Some).map_err(|e| Error::Corrupted {
        travel: id.clone(),
        reason: e.to_string(),
      }),
    }
  }

  // ── Transactional mutations ───────────────────────────────────────────

  async fn add_travel(&self, travel: &Travel) -> Result<()> {
    let uid_str = travel.uid().to_string();
    let doc_str = serde_json::Value::Object(travel.to_doc()).to_string();
    let flat = travel.participant_uids();
    let flat_json = encode_uid_list(&flat)?;
    let member_strs: Vec<String> =
      flat.iter().map(ToString::to_string).collect();
    let title = travel.title().to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM travels WHERE uid = ?1",
            rusqlite::params![uid_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(Err(TxFail::DuplicateTravel));
        }

        for member in &member_strs {
          if let Err(fail) = attach_travel(&tx, member, &uid_str)? {
            return Ok(Err(fail));
          }
        }

        tx.execute(
          "INSERT INTO travels (uid, doc, participant_uids) VALUES (?1, ?2, ?3)",
          rusqlite::params![uid_str, doc_str, flat_json],
        )?;

        insert_event(
          &tx,
          &uid_str,
          EventKind::StartOfJourney,
          &title,
          &format!("\"{title}\" was created"),
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome.map_err(|fail| fail.into_error(travel.uid()))
  }

  async fn update_travel(&self, travel: &Travel, mode: UpdateMode) -> Result<()> {
    match mode {
      UpdateMode::FieldsUpdate => self.overwrite_doc(travel).await,
      UpdateMode::AddParticipant { user } => {
        self.membership_update(travel, &user, true).await
      }
      UpdateMode::RemoveParticipant { user } => {
        self.membership_update(travel, &user, false).await
      }
    }
  }

  async fn delete_travel(&self, id: &Uid) -> Result<()> {
    let uid_str = id.to_string();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let stored: Option<String> = tx
          .query_row(
            "SELECT participant_uids FROM travels WHERE uid = ?1",
            rusqlite::params![uid_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(raw_members) = stored else {
          return Ok(Err(TxFail::MissingTravel));
        };
        let members: Vec<String> = match serde_json::from_str(&raw_members) {
          Ok(m) => m,
          Err(_) => return Ok(Err(TxFail::CorruptTravel)),
        };

        for member in &members {
          match detach_travel(&tx, member, &uid_str)? {
            Ok(()) => {}
            // A roster entry whose profile is already gone leaves nothing
            // to detach.
            Err(TxFail::MissingProfile(_)) => {}
            Err(fail) => return Ok(Err(fail)),
          }
        }

        // Journal rows go with the travel (ON DELETE CASCADE).
        tx.execute(
          "DELETE FROM travels WHERE uid = ?1",
          rusqlite::params![uid_str],
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome.map_err(|fail| fail.into_error(id))
  }

  // ── Profiles ──────────────────────────────────────────────────────────

  async fn get_profile(&self, id: &Uid) -> Result<Option<Profile>> {
    let uid_str = id.to_string();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, username, email, name, friends, travels, needs_onboarding
               FROM profiles WHERE uid = ?1",
              rusqlite::params![uid_str],
              read_profile_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
    let email_owned = email.to_owned();

    let mut raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT uid, username, email, name, friends, travels, needs_onboarding
           FROM profiles WHERE email = ?1 LIMIT 2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![email_owned], read_profile_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if raws.len() > 1 {
      tracing::warn!(
        email,
        "multiple profiles share one email; treating lookup as not found"
      );
      return Ok(None);
    }
    raws.pop().map(RawProfile::into_profile).transpose()
  }

  async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
    let uid_str = profile.uid.to_string();
    let username = profile.username.clone();
    let email = profile.email.clone();
    let name = profile.name.clone();
    let friends = encode_uid_list(&profile.friends)?;
    let travels = encode_uid_list(&profile.travels)?;
    let needs_onboarding = profile.needs_onboarding;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO profiles
             (uid, username, email, name, friends, travels, needs_onboarding)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            uid_str,
            username,
            email,
            name,
            friends,
            travels,
            needs_onboarding,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Journal ───────────────────────────────────────────────────────────

  async fn events_for_travel(&self, travel: &Uid) -> Result<Vec<Event>> {
    let uid_str = travel.to_string();

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, travel_uid, kind, at, title, description
           FROM events WHERE travel_uid = ?1 ORDER BY at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![uid_str], |row| {
            Ok(RawEvent {
              event_id:    row.get(0)?,
              travel_uid:  row.get(1)?,
              kind:        row.get(2)?,
              at:          row.get(3)?,
              title:       row.get(4)?,
              description: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}

// ─── NotificationStore impl ──────────────────────────────────────────────────

impl NotificationStore for SqliteStore {
  type Error = Error;

  async fn push(&self, notification: &Notification) -> Result<()> {
    let id_str = encode_uuid(notification.id);
    let to_str = notification.to.to_string();
    let from_str = notification.from.to_string();
    let at_str = encode_dt(notification.at);
    let is_read = notification.read;
    let content = serde_json::to_string(&notification.content)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications
             (notification_id, to_uid, from_uid, at, is_read, content)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, to_str, from_str, at_str, is_read, content],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn notifications_for_user(&self, user: &Uid) -> Result<Vec<Notification>> {
    let user_str = user.to_string();

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, to_uid, from_uid, at, is_read, content
           FROM notifications WHERE to_uid = ?1 ORDER BY at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              to_uid:          row.get(1)?,
              from_uid:        row.get(2)?,
              at:              row.get(3)?,
              is_read:         row.get(4)?,
              content:         row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }

  async fn mark_read(&self, id: &Uuid) -> Result<()> {
    let id_str = encode_uuid(*id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::NotificationNotFound(*id));
    }
    Ok(())
  }
}

// ─── Transaction plumbing ────────────────────────────────────────────────────

/// A domain-level reason to unwind the surrounding transaction. Returned as
/// the closure's success value so the `rusqlite::Transaction` drops without
/// committing.
enum TxFail {
  MissingTravel,
  DuplicateTravel,
  CorruptTravel,
  MissingProfile(String),
  CorruptProfile(String),
}

impl TxFail {
  fn into_error(self, travel: &Uid) -> Error {
    match self {
      Self::MissingTravel => Error::TravelNotFound(travel.clone()),
      Self::DuplicateTravel => Error::TravelExists(travel.clone()),
      Self::CorruptTravel => Error::Corrupted {
        travel: travel.clone(),
        reason: "stored participant list does not parse".to_owned(),
      },
      Self::MissingProfile(uid) => match Uid::parse(uid) {
        Ok(uid) => Error::ProfileNotFound(uid),
        Err(e) => Error::Core(e),
      },
      Self::CorruptProfile(uid) => match Uid::parse(uid) {
        Ok(uid) => Error::CorruptedProfile(uid),
        Err(e) => Error::Core(e),
      },
    }
  }
}

type TxStep = std::result::Result<std::result::Result<(), TxFail>, tokio_rusqlite::Error>;

fn read_profile_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProfile> {
  Ok(RawProfile {
    uid:              row.get(0)?,
    username:         row.get(1)?,
    email:            row.get(2)?,
    name:             row.get(3)?,
    friends:          row.get(4)?,
    travels:          row.get(5)?,
    needs_onboarding: row.get(6)?,
  })
}

fn profile_email(
  tx: &rusqlite::Transaction<'_>,
  user: &str,
) -> std::result::Result<Option<String>, tokio_rusqlite::Error> {
  Ok(
    tx.query_row(
      "SELECT email FROM profiles WHERE uid = ?1",
      rusqlite::params![user],
      |row| row.get(0),
    )
    .optional()?,
  )
}

/// Append `travel_uid` to `user`'s stored travel list (idempotent).
fn attach_travel(
  tx: &rusqlite::Transaction<'_>,
  user: &str,
  travel_uid: &str,
) -> TxStep {
  let stored: Option<String> = tx
    .query_row(
      "SELECT travels FROM profiles WHERE uid = ?1",
      rusqlite::params![user],
      |row| row.get(0),
    )
    .optional()?;
  let Some(raw) = stored else {
    return Ok(Err(TxFail::MissingProfile(user.to_owned())));
  };

  let mut list: Vec<String> = match serde_json::from_str(&raw) {
    Ok(list) => list,
    Err(_) => return Ok(Err(TxFail::CorruptProfile(user.to_owned()))),
  };
  if !list.iter().any(|t| t == travel_uid) {
    list.push(travel_uid.to_owned());
  }

  write_travel_list(tx, user, &list)?;
  Ok(Ok(()))
}

/// Remove `travel_uid` from `user`'s stored travel list.
fn detach_travel(
  tx: &rusqlite::Transaction<'_>,
  user: &str,
  travel_uid: &str,
) -> TxStep {
  let stored: Option<String> = tx
    .query_row(
      "SELECT travels FROM profiles WHERE uid = ?1",
      rusqlite::params![user],
      |row| row.get(0),
    )
    .optional()?;
  let Some(raw) = stored else {
    return Ok(Err(TxFail::MissingProfile(user.to_owned())));
  };

  let mut list: Vec<String> = match serde_json::from_str(&raw) {
    Ok(list) => list,
    Err(_) => return Ok(Err(TxFail::CorruptProfile(user.to_owned()))),
  };
  list.retain(|t| t != travel_uid);

  write_travel_list(tx, user, &list)?;
  Ok(Ok(()))
}

fn write_travel_list(
  tx: &rusqlite::Transaction<'_>,
  user: &str,
  list: &[String],
) -> std::result::Result<(), tokio_rusqlite::Error> {
  let encoded = serde_json::to_string(list)
    .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
  tx.execute(
    "UPDATE profiles SET travels = ?2 WHERE uid = ?1",
    rusqlite::params![user, encoded],
  )?;
  Ok(())
}

/// Insert a journal row stamped now with a fresh server-generated id.
fn insert_event(
  tx: &rusqlite::Transaction<'_>,
  travel_uid: &str,
  kind: EventKind,
  title: &str,
  description: &str,
) -> std::result::Result<(), tokio_rusqlite::Error> {
  tx.execute(
    "INSERT INTO events (event_id, travel_uid, kind, at, title, description)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      travel_uid,
      kind.to_string(),
      encode_dt(Utc::now()),
      title,
      description,
    ],
  )?;
  Ok(())
}
