//! Envelope - the wire representation of a weather record on the sync channel.

use serde::{Deserialize, Serialize};

use crate::{SyncError, WeatherRecord};

/// The fixed logical path identifying the shared weather record.
///
/// Both roles must agree on this constant; data events for other paths are
/// ignored by the observer.
pub const WEATHER_PATH: &str = "/weather";

/// The versioned wire record exchanged over the sync channel.
///
/// Encoded as a MessagePack map keyed by field name, so a decoder tolerates
/// envelopes with individually missing fields: absent strings decode to
/// `""`, an absent condition code to the sentinel `0`. Envelopes are
/// append-only from the transport's point of view - each publish creates a
/// new version, and only the latest surviving version is guaranteed
/// observable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEnvelope {
    /// Meteorological condition identifier (0 = absent).
    #[serde(rename = "conditionCode", default)]
    pub condition_code: u32,
    /// Formatted high temperature.
    #[serde(rename = "tempHigh", default)]
    pub temp_high: String,
    /// Formatted low temperature.
    #[serde(rename = "tempLow", default)]
    pub temp_low: String,
    /// Wall-clock milliseconds since epoch at publish time.
    #[serde(rename = "publishedAt", default)]
    pub published_at: u64,
}

impl SyncEnvelope {
    /// Build an envelope from a record for publishing.
    pub fn from_record(record: &WeatherRecord) -> Self {
        Self {
            condition_code: record.condition_code,
            temp_high: record.temp_high.clone(),
            temp_low: record.temp_low.clone(),
            published_at: record.published_at,
        }
    }

    /// Convert a decoded envelope into a record.
    pub fn into_record(self) -> WeatherRecord {
        WeatherRecord {
            condition_code: self.condition_code,
            temp_high: self.temp_high,
            temp_low: self.temp_low,
            published_at: self.published_at,
        }
    }

    /// Serialize to MessagePack bytes, fields keyed by name.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        rmp_serde::to_vec_named(self).map_err(SyncError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    ///
    /// Missing fields yield their defaults; unknown fields are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        rmp_serde::from_slice(bytes).map_err(SyncError::Deserialization)
    }
}
