//! The synchronized weather record.

use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel condition code meaning "no data yet".
///
/// A record carrying this code must never be published; the sync channel
/// suppresses it.
pub const NO_CONDITION: u32 = 0;

/// The small, frequently-changing record kept in sync between the primary
/// and the companion.
///
/// Immutable once constructed - a fresh publish builds a fresh record.
/// Temperatures are pre-formatted strings; unit and locale handling belongs
/// to the formatting collaborator on the primary, not to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRecord {
    /// Meteorological condition identifier ([`NO_CONDITION`] = absent).
    pub condition_code: u32,
    /// Formatted high temperature, e.g. `"23°"`.
    pub temp_high: String,
    /// Formatted low temperature, e.g. `"19°"`.
    pub temp_low: String,
    /// Wall-clock milliseconds since epoch at publish time.
    pub published_at: u64,
}

impl WeatherRecord {
    /// Create a record stamped with the current wall clock.
    pub fn new(condition_code: u32, temp_high: impl Into<String>, temp_low: impl Into<String>) -> Self {
        Self {
            condition_code,
            temp_high: temp_high.into(),
            temp_low: temp_low.into(),
            published_at: now_millis(),
        }
    }

    /// Whether this record carries real data.
    ///
    /// False for the [`NO_CONDITION`] sentinel; such records are suppressed
    /// by the publish path.
    pub fn has_data(&self) -> bool {
        self.condition_code != NO_CONDITION
    }
}

/// Current wall clock in milliseconds since the Unix epoch.
///
/// Informational only - envelope versioning is owned by the transport, not
/// by this timestamp.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
