//! Staleness rules for the cached feed.

use chrono::{DateTime, Days, Utc};

/// Default number of days a cached feed may be served.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 7;

/// Decides whether a cached feed is still fresh enough to serve.
///
/// Age is measured in calendar days from the moment the feed was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
  max_age_days: u32,
}

impl CachePolicy {
  pub fn new(max_age_days: u32) -> Self {
    Self { max_age_days }
  }

  pub fn max_age_days(&self) -> u32 {
    self.max_age_days
  }

  /// A feed written at `timestamp` is valid strictly before `timestamp + max age`.
  ///
  /// Returns `false` when the boundary cannot be represented.
  pub fn validate(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match timestamp.checked_add_days(Days::new(u64::from(self.max_age_days))) {
      Some(max_age) => now < max_age,
      None => false,
    }
  }
}

impl Default for CachePolicy {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_AGE_DAYS)
  }
}
