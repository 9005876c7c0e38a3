//! The `TravelStore` and `NotificationStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `wayfare-store-sqlite`). Higher layers (`wayfare-api`, `wayfare-cli`)
//! depend on these abstractions, not on any concrete backend.
//!
//! Every asynchronous operation reports its outcome exactly once through
//! `Result`: either the success value or the causing error, never both,
//! never an exception across the async boundary.

use std::future::Future;

use uuid::Uuid;

use crate::{
  event::Event,
  notification::Notification,
  profile::Profile,
  travel::Travel,
  uid::Uid,
};

// ─── Update modes ────────────────────────────────────────────────────────────

/// Which multi-document transaction [`TravelStore::update_travel`] runs.
///
/// The membership variants carry the affected user's id, so an add/remove
/// without a target is unrepresentable; the matching journal entry is
/// written by the store inside the same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateMode {
  /// Overwrite the travel document only. No journal entry, no profile
  /// writes.
  FieldsUpdate,
  /// The caller has already merged `user` into the travel's roster; the
  /// store also appends the travel to `user`'s profile and journals a
  /// [`crate::event::EventKind::NewParticipant`] entry.
  AddParticipant { user: Uid },
  /// Symmetric to `AddParticipant` for a departing member.
  RemoveParticipant { user: Uid },
}

// ─── Travel store ────────────────────────────────────────────────────────────

/// Abstraction over a travel-organizer backend.
///
/// Mutations that change membership touch three denormalised views — the
/// travel's roster, each affected profile's travel list, and the journal —
/// and implementations must apply each such mutation atomically: a partial
/// write would corrupt the membership query behind
/// [`TravelStore::travels_for_user`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TravelStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// A fresh collision-resistant document identifier.
  fn new_uid(&self) -> Uid;

  // ── Travels ───────────────────────────────────────────────────────────

  /// All travels whose flat participant list contains `user`. Stored
  /// documents that fail conversion are skipped, not errors.
  fn travels_for_user<'a>(
    &'a self,
    user: &'a Uid,
  ) -> impl Future<Output = Result<Vec<Travel>, Self::Error>> + Send + 'a;

  /// Retrieve one travel. `None` when absent; a present but corrupted
  /// document is an explicit error.
  fn get_travel<'a>(
    &'a self,
    id: &'a Uid,
  ) -> impl Future<Output = Result<Option<Travel>, Self::Error>> + Send + 'a;

  /// Transactionally create `travel`: persist the document, append its id
  /// to every participant's profile, and journal a
  /// [`crate::event::EventKind::StartOfJourney`] entry.
  fn add_travel<'a>(
    &'a self,
    travel: &'a Travel,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Apply `mode` to an existing travel; see [`UpdateMode`].
  fn update_travel<'a>(
    &'a self,
    travel: &'a Travel,
    mode: UpdateMode,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Transactionally delete a travel: detach its id from every
  /// participant's profile, then remove the document (and its journal).
  /// A partial cascade must never be observable.
  fn delete_travel<'a>(
    &'a self,
    id: &'a Uid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn get_profile<'a>(
    &'a self,
    id: &'a Uid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Look a profile up by email. "No match" and "ambiguous match" (more
  /// than one row) are both `Ok(None)`; the ambiguous case is logged as a
  /// data-integrity warning.
  fn profile_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Create or replace a profile record.
  fn upsert_profile<'a>(
    &'a self,
    profile: &'a Profile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Journal ───────────────────────────────────────────────────────────

  /// The travel's journal, oldest first.
  fn events_for_travel<'a>(
    &'a self,
    travel: &'a Uid,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;
}

// ─── Notification store ──────────────────────────────────────────────────────

/// Abstraction over a notification backend; mirrors the travel store's
/// shape for a much simpler record.
pub trait NotificationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn push<'a>(
    &'a self,
    notification: &'a Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Notifications addressed to `user`, newest first.
  fn notifications_for_user<'a>(
    &'a self,
    user: &'a Uid,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  fn mark_read<'a>(
    &'a self,
    id: &'a Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
