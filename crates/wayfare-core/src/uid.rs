//! `Uid` — the 20-character alphanumeric identifier used for travels, users,
//! and participant keys.
//!
//! Format violations are hard construction-time failures, never coerced.
//! Journal events and notifications use server-generated [`uuid::Uuid`]s
//! instead; the fixed-width format below binds only document identifiers.

use std::fmt;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

/// Required identifier length.
pub const UID_LEN: usize = 20;

const ALPHABET: &[u8; 62] =
  b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A validated document identifier: exactly [`UID_LEN`] ASCII alphanumeric
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(String);

impl Uid {
  /// Validate `s` and wrap it. Fails on wrong length or any byte outside
  /// `[A-Za-z0-9]`.
  pub fn parse(s: impl Into<String>) -> Result<Self> {
    let s = s.into();
    if s.len() != UID_LEN {
      return Err(Error::BadUidLength(s.len()));
    }
    if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
      return Err(Error::BadUidCharacter(s));
    }
    Ok(Self(s))
  }

  /// Generate a fresh collision-resistant identifier from the OS CSPRNG.
  ///
  /// Bytes ≥ 248 are rejected so the draw over the 62-character alphabet
  /// stays uniform (248 = 62 * 4).
  pub fn generate() -> Self {
    let mut out = String::with_capacity(UID_LEN);
    let mut buf = [0u8; 32];
    while out.len() < UID_LEN {
      OsRng.fill_bytes(&mut buf);
      for b in buf {
        if out.len() == UID_LEN {
          break;
        }
        if b < 248 {
          out.push(ALPHABET[(b % 62) as usize] as char);
        }
      }
    }
    Self(out)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Uid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Serialize for Uid {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for Uid {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Self::parse(s).map_err(de::Error::custom)
  }
}
