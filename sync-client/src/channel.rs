//! The put/observe sync channel and the local display notification.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;
use wearsync_types::{SyncEnvelope, SyncError, WeatherRecord, WEATHER_PATH};

use crate::transport::{PairingTransport, TransportError};

/// Errors on the publish path.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Envelope encoding failed.
    #[error("encode error: {0}")]
    Encode(#[from] SyncError),
}

/// What a publish call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// An envelope was written at the weather path.
    Published,
    /// The record carried the sentinel condition code; nothing was written.
    Suppressed,
}

/// The sync channel for the weather record.
///
/// Primary side: [`publish`](SyncChannel::publish) serializes the record
/// into an envelope and writes it at [`WEATHER_PATH`]; each call creates a
/// strictly newer version and observers converge to the latest one.
///
/// Companion side: decode happens in the coordinator (it owns path
/// filtering and tolerant decoding); [`notify`](SyncChannel::notify) then
/// hands the decoded record to the display layer through a watch channel,
/// whose keep-latest semantics match the record's last-write-wins model.
/// There is no polling - redraw is purely event-driven.
pub struct SyncChannel<T> {
    transport: Arc<T>,
    record_tx: watch::Sender<Option<WeatherRecord>>,
}

impl<T: PairingTransport> SyncChannel<T> {
    /// Create a channel over a shared transport handle.
    pub fn new(transport: Arc<T>) -> Self {
        let (record_tx, _) = watch::channel(None);
        Self {
            transport,
            record_tx,
        }
    }

    /// Subscribe to decoded records for the display layer.
    ///
    /// The receiver holds `None` until the first successful decode, then
    /// always the latest record.
    pub fn subscribe(&self) -> watch::Receiver<Option<WeatherRecord>> {
        self.record_tx.subscribe()
    }

    /// Publish a record as a new envelope version at the weather path.
    ///
    /// A record with no data is suppressed - the sentinel must never be
    /// published.
    pub async fn publish(&self, record: &WeatherRecord) -> Result<PublishOutcome, ChannelError> {
        if !record.has_data() {
            debug!("record has no data, publish suppressed");
            return Ok(PublishOutcome::Suppressed);
        }

        let bytes = SyncEnvelope::from_record(record).to_bytes()?;
        self.transport.put_data(WEATHER_PATH, &bytes).await?;
        debug!(
            condition = record.condition_code,
            published_at = record.published_at,
            "published weather envelope"
        );
        Ok(PublishOutcome::Published)
    }

    /// Replace the current record and wake display-layer subscribers.
    pub fn notify(&self, record: WeatherRecord) {
        self.record_tx.send_replace(Some(record));
    }

    /// The latest record handed to the display layer, if any.
    pub fn latest(&self) -> Option<WeatherRecord> {
        self.record_tx.borrow().clone()
    }
}
