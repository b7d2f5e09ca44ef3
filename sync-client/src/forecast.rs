//! Collaborator interfaces on the primary side.
//!
//! The local weather store and the unit/locale formatter are external
//! collaborators: this crate queries them when asked to publish and never
//! looks inside.

/// Today's forecast as raw values from the local store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    /// Meteorological condition identifier.
    pub condition_code: u32,
    /// Raw maximum temperature.
    pub temp_max: f64,
    /// Raw minimum temperature.
    pub temp_min: f64,
}

/// The authoritative local data source on the primary.
pub trait WeatherStore: Send + Sync {
    /// Today's forecast, or `None` when the store has no row - which means
    /// there is nothing to publish.
    fn today(&self) -> Option<Forecast>;
}

/// Applies unit and locale formatting to raw temperatures.
pub trait UnitFormatter: Send + Sync {
    /// Format a raw temperature for display, e.g. `23.4` → `"23°"`.
    fn format_temperature(&self, degrees: f64) -> String;
}
