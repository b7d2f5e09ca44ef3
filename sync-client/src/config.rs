//! Service configuration.

/// Configuration for a sync service instance.
///
/// There are no files, flags, or environment variables behind this - the
/// host constructs it explicitly.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Human-readable device name, used in logs.
    pub device_name: String,
}

impl SyncConfig {
    /// Create a configuration with the default device name.
    pub fn new() -> Self {
        Self {
            device_name: "wearsync device".to_string(),
        }
    }

    /// Set the device name.
    pub fn with_device_name(mut self, name: &str) -> Self {
        self.device_name = name.to_string();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
