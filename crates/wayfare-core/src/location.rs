//! `Location` — an immutable coordinate with a label and a recording time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Error, Result};

/// A named point on the globe. Validated at construction and immutable
/// afterwards; deserialisation goes through [`Location::new`] so stored data
/// is held to the same rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
  latitude:    f64,
  longitude:   f64,
  recorded_at: DateTime<Utc>,
  name:        String,
}

impl Location {
  /// Validates: latitude in `[-90, 90]`, longitude in `[-180, 180]` (NaN
  /// fails both range checks), `name` non-blank. Boundary values are
  /// accepted exactly.
  pub fn new(
    latitude: f64,
    longitude: f64,
    recorded_at: DateTime<Utc>,
    name: impl Into<String>,
  ) -> Result<Self> {
    if !(-90.0..=90.0).contains(&latitude) {
      return Err(Error::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
      return Err(Error::LongitudeOutOfRange(longitude));
    }
    let name = name.into();
    if name.trim().is_empty() {
      return Err(Error::BlankLocationName);
    }
    Ok(Self { latitude, longitude, recorded_at, name })
  }

  pub fn latitude(&self) -> f64 { self.latitude }

  pub fn longitude(&self) -> f64 { self.longitude }

  pub fn recorded_at(&self) -> DateTime<Utc> { self.recorded_at }

  pub fn name(&self) -> &str { &self.name }
}
