//! `Participant` and `Role` — the membership vocabulary of a travel.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::uid::Uid;

/// One member of a travel's roster. Two participants are equal iff their
/// identifiers are equal; the type exists to make the roster map's key
/// domain explicit.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Participant(Uid);

impl Participant {
  pub fn new(uid: Uid) -> Self { Self(uid) }

  pub fn uid(&self) -> &Uid { &self.0 }

  pub fn into_uid(self) -> Uid { self.0 }
}

/// What a participant may do within one specific travel. No ordering between
/// roles; membership is the only invariant.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Owner,
  Organizer,
  Participant,
}
