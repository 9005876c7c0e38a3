//! `Profile` — the per-user record referenced by travel membership.
//!
//! The `travels` field is the denormalised per-user travel list that the
//! store's transactional protocol keeps consistent with each travel's
//! roster.

use serde::{Deserialize, Serialize};

use crate::uid::Uid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub uid:              Uid,
  pub username:         String,
  pub email:            String,
  pub name:             String,
  pub friends:          Vec<Uid>,
  /// Ids of every travel this user participates in. Maintained only by the
  /// store's travel transactions.
  pub travels:          Vec<Uid>,
  pub needs_onboarding: bool,
}

impl Profile {
  pub fn contains_travel(&self, travel: &Uid) -> bool {
    self.travels.contains(travel)
  }
}
