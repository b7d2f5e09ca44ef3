//! The sync service - single owner of the session and the coordinator.
//!
//! The service is an actor: it consumes transport events and external
//! commands from one task, feeds them into the pure coordinator, and
//! executes the actions the coordinator returns. All state transitions are
//! serialized by construction, even if the underlying transport delivers
//! callbacks concurrently.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use wearsync_core::{Action, Coordinator, DeviceRole, Event, Phase};
use wearsync_types::{SessionState, WeatherRecord};

use crate::channel::{PublishOutcome, SyncChannel};
use crate::config::SyncConfig;
use crate::forecast::{UnitFormatter, WeatherStore};
use crate::requester::RefreshRequester;
use crate::session::TransportSession;
use crate::transport::{PairingTransport, TransportEvent, TransportEvents};

/// External wake commands for a running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Process start or an explicit start signal.
    Start,
    /// Tear down the session and stop the service.
    Shutdown,
}

/// Cloneable handle for waking or stopping a running service.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ServiceHandle {
    /// Create a handle and the command receiver to pass to
    /// [`SyncService::run`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (commands, rx) = mpsc::unbounded_channel();
        (Self { commands }, rx)
    }

    /// Deliver a start wake.
    pub fn start(&self) {
        let _ = self.commands.send(Command::Start);
    }

    /// Request teardown. The service unregisters listeners and disconnects
    /// before stopping.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Orchestrates the transport session, peer refreshes, and the sync
/// channel for one device.
///
/// Construct with [`primary`](SyncService::primary) or
/// [`companion`](SyncService::companion), then either drive it through
/// [`run`](SyncService::run) or feed events directly with
/// [`on_transport_event`](SyncService::on_transport_event) /
/// [`on_command`](SyncService::on_command).
pub struct SyncService<T> {
    config: SyncConfig,
    session: TransportSession<T>,
    transport: Arc<T>,
    requester: RefreshRequester<T>,
    channel: SyncChannel<T>,
    coordinator: Coordinator,
    store: Option<Arc<dyn WeatherStore>>,
    formatter: Option<Arc<dyn UnitFormatter>>,
}

impl<T: PairingTransport> SyncService<T> {
    /// Build a primary-side service over its local store and formatter.
    pub fn primary(
        config: SyncConfig,
        transport: T,
        store: Arc<dyn WeatherStore>,
        formatter: Arc<dyn UnitFormatter>,
    ) -> Self {
        Self::build(
            config,
            transport,
            DeviceRole::Primary,
            Some(store),
            Some(formatter),
        )
    }

    /// Build a companion-side service. It has no data source of its own.
    pub fn companion(config: SyncConfig, transport: T) -> Self {
        Self::build(config, transport, DeviceRole::Companion, None, None)
    }

    fn build(
        config: SyncConfig,
        transport: T,
        role: DeviceRole,
        store: Option<Arc<dyn WeatherStore>>,
        formatter: Option<Arc<dyn UnitFormatter>>,
    ) -> Self {
        let transport = Arc::new(transport);
        Self {
            config,
            session: TransportSession::new(Arc::clone(&transport)),
            requester: RefreshRequester::new(Arc::clone(&transport)),
            channel: SyncChannel::new(Arc::clone(&transport)),
            transport,
            coordinator: Coordinator::new(role),
            store,
            formatter,
        }
    }

    /// Subscribe to decoded records for the display layer.
    pub fn subscribe(&self) -> watch::Receiver<Option<WeatherRecord>> {
        self.channel.subscribe()
    }

    /// The latest record handed to the display layer, if any.
    pub fn latest_record(&self) -> Option<WeatherRecord> {
        self.channel.latest()
    }

    /// Current coordinator phase.
    pub fn phase(&self) -> Phase {
        self.coordinator.phase()
    }

    /// Current transport session state.
    pub fn session_state(&self) -> &SessionState {
        self.session.state()
    }

    /// Consume events and commands until shutdown.
    ///
    /// Dispatches a start wake first, so spawning the service is enough to
    /// bring the session up.
    pub async fn run(
        mut self,
        mut events: TransportEvents,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        info!(
            device = %self.config.device_name,
            role = ?self.coordinator.role(),
            "sync service starting"
        );
        self.dispatch(Event::StartRequested).await;

        loop {
            tokio::select! {
                Some(command) = commands.recv() => {
                    if !self.on_command(command).await {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Some(event) => self.on_transport_event(event).await,
                    None => {
                        debug!("transport event stream closed");
                        self.dispatch(Event::DisconnectRequested).await;
                        break;
                    }
                },
                else => break,
            }
        }

        info!(device = %self.config.device_name, "sync service stopped");
    }

    /// Handle one external command. Returns `false` once the service
    /// should stop.
    pub async fn on_command(&mut self, command: Command) -> bool {
        match command {
            Command::Start => {
                self.dispatch(Event::StartRequested).await;
                true
            }
            Command::Shutdown => {
                self.dispatch(Event::DisconnectRequested).await;
                false
            }
        }
    }

    /// Handle one transport event: update the session state, then let the
    /// coordinator decide what to do.
    pub async fn on_transport_event(&mut self, event: TransportEvent) {
        let event = match event {
            TransportEvent::Connected => {
                self.session.on_connected();
                info!("session connected");
                Event::SessionConnected
            }
            TransportEvent::Suspended => {
                self.session.on_suspended();
                info!("session suspended");
                Event::SessionSuspended
            }
            TransportEvent::Failed { reason } => {
                self.session.on_failed(reason.clone());
                warn!(%reason, "session failed");
                Event::SessionFailed { reason }
            }
            TransportEvent::Disconnected => {
                self.session.on_disconnected();
                info!("session disconnected");
                Event::SessionDisconnected
            }
            TransportEvent::PeerArrived { peer } => {
                info!(peer = %peer.id, name = %peer.display_name, "peer arrived");
                Event::PeerArrived { peer }
            }
            TransportEvent::PeerDeparted { id } => {
                info!(peer = %id, "peer departed");
                Event::PeerDeparted { id }
            }
            TransportEvent::MessageReceived { from, payload } => {
                debug!(peer = %from, "message received");
                Event::MessageReceived { from, payload }
            }
            TransportEvent::DataChanged { path, payload } => {
                debug!(%path, "data changed");
                Event::DataChanged { path, payload }
            }
        };
        self.dispatch(event).await;
    }

    /// Run one event through the coordinator and execute the resulting
    /// actions; actions may feed further events back in (e.g. the peer
    /// enumeration result), which are processed in order.
    async fn dispatch(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for action in self.coordinator.on_event(event) {
                if let Some(follow_up) = self.execute(action).await {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    async fn execute(&mut self, action: Action) -> Option<Event> {
        match action {
            Action::Connect => match self.session.connect().await {
                Ok(()) => None,
                Err(e) => {
                    warn!(error = %e, "session connect failed");
                    Some(Event::SessionFailed {
                        reason: e.to_string(),
                    })
                }
            },
            Action::Disconnect => {
                if let Err(e) = self.session.disconnect().await {
                    warn!(error = %e, "disconnect failed");
                }
                None
            }
            Action::RegisterListeners => {
                self.transport.register_listeners();
                None
            }
            Action::UnregisterListeners => {
                self.transport.unregister_listeners();
                None
            }
            Action::EnumeratePeers => match self.transport.connected_peers().await {
                Ok(peers) => Some(Event::PeersEnumerated { peers }),
                Err(e) => {
                    warn!(error = %e, "peer enumeration failed");
                    None
                }
            },
            Action::RequestRefresh { peer } => {
                self.requester.request_refresh(&peer).await;
                None
            }
            Action::Publish => {
                self.publish_current().await;
                None
            }
            Action::NotifyDisplay { record } => {
                self.channel.notify(record);
                None
            }
        }
    }

    /// Query the local store and publish, best effort. No row and the
    /// sentinel record are silent skips; a transport failure is logged and
    /// recovered by the next wake.
    async fn publish_current(&self) {
        let (Some(store), Some(formatter)) = (&self.store, &self.formatter) else {
            debug!("no local weather store, nothing to publish");
            return;
        };

        let Some(forecast) = store.today() else {
            debug!("no forecast row for today, skipping publish");
            return;
        };

        let record = WeatherRecord::new(
            forecast.condition_code,
            formatter.format_temperature(forecast.temp_max),
            formatter.format_temperature(forecast.temp_min),
        );

        match self.channel.publish(&record).await {
            Ok(PublishOutcome::Published) => {
                info!(condition = record.condition_code, "published weather record");
            }
            Ok(PublishOutcome::Suppressed) => {}
            Err(e) => warn!(error = %e, "publish failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::Forecast;
    use crate::requester::REFRESH_COMMAND;
    use crate::transport::MockTransport;
    use std::sync::Mutex;
    use wearsync_types::{Peer, PeerId, SyncEnvelope, WEATHER_PATH};

    struct FixedStore(Forecast);

    impl WeatherStore for FixedStore {
        fn today(&self) -> Option<Forecast> {
            Some(self.0)
        }
    }

    struct EmptyStore;

    impl WeatherStore for EmptyStore {
        fn today(&self) -> Option<Forecast> {
            None
        }
    }

    struct VarStore(Mutex<Option<Forecast>>);

    impl VarStore {
        fn set(&self, forecast: Forecast) {
            *self.0.lock().unwrap() = Some(forecast);
        }
    }

    impl WeatherStore for VarStore {
        fn today(&self) -> Option<Forecast> {
            *self.0.lock().unwrap()
        }
    }

    struct DegreeFormatter;

    impl UnitFormatter for DegreeFormatter {
        fn format_temperature(&self, degrees: f64) -> String {
            format!("{degrees:.0}°")
        }
    }

    fn forecast(condition_code: u32, temp_max: f64, temp_min: f64) -> Forecast {
        Forecast {
            condition_code,
            temp_max,
            temp_min,
        }
    }

    fn primary_over(
        transport: &MockTransport,
        store: Arc<dyn WeatherStore>,
    ) -> SyncService<MockTransport> {
        SyncService::primary(
            SyncConfig::new().with_device_name("test primary"),
            transport.clone(),
            store,
            Arc::new(DegreeFormatter),
        )
    }

    fn companion_over(transport: &MockTransport) -> SyncService<MockTransport> {
        SyncService::companion(
            SyncConfig::new().with_device_name("test companion"),
            transport.clone(),
        )
    }

    async fn bring_ready(service: &mut SyncService<MockTransport>) {
        service.on_command(Command::Start).await;
        service.on_transport_event(TransportEvent::Connected).await;
        assert_eq!(service.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn primary_publishes_on_session_ready() {
        let transport = MockTransport::new();
        let mut service = primary_over(&transport, Arc::new(FixedStore(forecast(800, 23.4, 19.2))));

        bring_ready(&mut service).await;

        let puts = transport.puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].0, WEATHER_PATH);

        let envelope = SyncEnvelope::from_bytes(&puts[0].1).unwrap();
        assert_eq!(envelope.condition_code, 800);
        assert_eq!(envelope.temp_high, "23°");
        assert_eq!(envelope.temp_low, "19°");
        assert!(envelope.published_at > 0);
    }

    #[tokio::test]
    async fn inbound_message_triggers_publish() {
        let transport = MockTransport::new();
        let mut service = primary_over(&transport, Arc::new(FixedStore(forecast(800, 23.0, 19.0))));
        bring_ready(&mut service).await;
        assert_eq!(transport.puts().len(), 1);

        // Payload content is irrelevant; any message is a refresh trigger
        service
            .on_transport_event(TransportEvent::MessageReceived {
                from: PeerId::new("watch"),
                payload: b"anything at all".to_vec(),
            })
            .await;

        assert_eq!(transport.puts().len(), 2);
    }

    #[tokio::test]
    async fn no_forecast_row_means_no_publish() {
        let transport = MockTransport::new();
        let mut service = primary_over(&transport, Arc::new(EmptyStore));
        bring_ready(&mut service).await;

        service
            .on_transport_event(TransportEvent::MessageReceived {
                from: PeerId::new("watch"),
                payload: REFRESH_COMMAND.to_vec(),
            })
            .await;

        assert!(transport.puts().is_empty());
    }

    #[tokio::test]
    async fn sentinel_forecast_is_suppressed() {
        let transport = MockTransport::new();
        let mut service = primary_over(&transport, Arc::new(FixedStore(forecast(0, 23.0, 19.0))));
        bring_ready(&mut service).await;

        assert!(transport.puts().is_empty());
    }

    #[tokio::test]
    async fn primary_publishes_when_peer_arrives() {
        let transport = MockTransport::new();
        let mut service = primary_over(&transport, Arc::new(FixedStore(forecast(800, 23.0, 19.0))));
        bring_ready(&mut service).await;
        assert_eq!(transport.puts().len(), 1);

        service
            .on_transport_event(TransportEvent::PeerArrived {
                peer: Peer::new("watch", "Watch"),
            })
            .await;

        assert_eq!(transport.puts().len(), 2);
    }

    #[tokio::test]
    async fn companion_requests_refresh_from_enumerated_peers() {
        let transport = MockTransport::new();
        transport.add_peer(Peer::new("phone", "Phone"));
        let mut service = companion_over(&transport);

        bring_ready(&mut service).await;

        let sent = transport.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, PeerId::new("phone"));
        assert_eq!(sent[0].1, REFRESH_COMMAND);
    }

    #[tokio::test]
    async fn newly_arrived_peer_gets_exactly_one_refresh() {
        let transport = MockTransport::new();
        let mut service = companion_over(&transport);
        bring_ready(&mut service).await;

        let peer = Peer::new("phone", "Phone");
        service
            .on_transport_event(TransportEvent::PeerArrived { peer: peer.clone() })
            .await;
        service
            .on_transport_event(TransportEvent::PeerArrived { peer })
            .await;

        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn observed_envelope_reaches_display_subscribers() {
        let transport = MockTransport::new();
        let mut service = companion_over(&transport);
        let mut rx = service.subscribe();
        bring_ready(&mut service).await;

        let record = WeatherRecord::new(800, "23°", "19°");
        service
            .on_transport_event(TransportEvent::DataChanged {
                path: WEATHER_PATH.to_string(),
                payload: SyncEnvelope::from_record(&record).to_bytes().unwrap(),
            })
            .await;

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone().unwrap();
        assert_eq!(seen.condition_code, 800);
        assert_eq!(seen.temp_high, "23°");
        assert_eq!(seen.temp_low, "19°");
        assert_eq!(service.latest_record(), Some(seen));
    }

    #[tokio::test]
    async fn unrelated_path_does_not_touch_display() {
        let transport = MockTransport::new();
        let mut service = companion_over(&transport);
        let rx = service.subscribe();
        bring_ready(&mut service).await;

        service
            .on_transport_event(TransportEvent::DataChanged {
                path: "/settings".to_string(),
                payload: SyncEnvelope::from_record(&WeatherRecord::new(800, "a", "b"))
                    .to_bytes()
                    .unwrap(),
            })
            .await;

        assert!(!rx.has_changed().unwrap());
        assert!(service.latest_record().is_none());
    }

    #[tokio::test]
    async fn unparseable_envelope_leaves_last_record_in_place() {
        let transport = MockTransport::new();
        let mut service = companion_over(&transport);
        bring_ready(&mut service).await;

        let record = WeatherRecord::new(500, "12°", "8°");
        service
            .on_transport_event(TransportEvent::DataChanged {
                path: WEATHER_PATH.to_string(),
                payload: SyncEnvelope::from_record(&record).to_bytes().unwrap(),
            })
            .await;
        service
            .on_transport_event(TransportEvent::DataChanged {
                path: WEATHER_PATH.to_string(),
                payload: vec![0xff, 0x13],
            })
            .await;

        assert_eq!(service.latest_record(), Some(record));
    }

    #[tokio::test]
    async fn round_trip_from_primary_message_to_companion_notification() {
        // Primary with a concrete forecast
        let primary_transport = MockTransport::new();
        let mut primary = primary_over(
            &primary_transport,
            Arc::new(FixedStore(forecast(800, 23.0, 19.0))),
        );
        bring_ready(&mut primary).await;

        primary
            .on_transport_event(TransportEvent::MessageReceived {
                from: PeerId::new("watch"),
                payload: REFRESH_COMMAND.to_vec(),
            })
            .await;
        let envelope_bytes = primary_transport.latest_put(WEATHER_PATH).unwrap();

        // Companion observes the envelope the primary put
        let companion_transport = MockTransport::new();
        let mut companion = companion_over(&companion_transport);
        let mut rx = companion.subscribe();
        bring_ready(&mut companion).await;

        companion
            .on_transport_event(TransportEvent::DataChanged {
                path: WEATHER_PATH.to_string(),
                payload: envelope_bytes,
            })
            .await;

        let seen = rx.borrow_and_update().clone().unwrap();
        assert_eq!(seen.condition_code, 800);
        assert_eq!(seen.temp_high, "23°");
        assert_eq!(seen.temp_low, "19°");
    }

    #[tokio::test]
    async fn rapid_publishes_converge_to_the_last_value() {
        let transport = MockTransport::new();
        let store = Arc::new(VarStore(Mutex::new(None)));
        let mut service = primary_over(&transport, store.clone());
        bring_ready(&mut service).await;

        for code in [500u32, 741, 800] {
            store.set(forecast(code, 23.0, 19.0));
            service
                .on_transport_event(TransportEvent::MessageReceived {
                    from: PeerId::new("watch"),
                    payload: REFRESH_COMMAND.to_vec(),
                })
                .await;
        }

        // An observer that reconnects now only sees the newest version
        let latest = transport.latest_put(WEATHER_PATH).unwrap();
        let envelope = SyncEnvelope::from_bytes(&latest).unwrap();
        assert_eq!(envelope.condition_code, 800);
    }

    #[tokio::test]
    async fn suspension_detaches_listeners_and_mutes_events() {
        let transport = MockTransport::new();
        let mut service = primary_over(&transport, Arc::new(FixedStore(forecast(800, 23.0, 19.0))));
        bring_ready(&mut service).await;
        assert!(transport.listeners_registered());
        let puts_before = transport.puts().len();

        service.on_transport_event(TransportEvent::Suspended).await;
        assert_eq!(service.phase(), Phase::Degraded);
        assert_eq!(service.session_state(), &SessionState::Suspended);
        assert!(!transport.listeners_registered());

        // Events delivered after the transition have no effect
        service
            .on_transport_event(TransportEvent::MessageReceived {
                from: PeerId::new("watch"),
                payload: REFRESH_COMMAND.to_vec(),
            })
            .await;
        assert_eq!(transport.puts().len(), puts_before);
    }

    #[tokio::test]
    async fn reconnect_after_suspension_restores_handling() {
        let transport = MockTransport::new();
        let mut service = primary_over(&transport, Arc::new(FixedStore(forecast(800, 23.0, 19.0))));
        bring_ready(&mut service).await;
        service.on_transport_event(TransportEvent::Suspended).await;

        // Transport reconnects without an explicit disconnect
        service.on_transport_event(TransportEvent::Connected).await;
        assert_eq!(service.phase(), Phase::Ready);
        assert!(transport.listeners_registered());

        let puts_before = transport.puts().len();
        service
            .on_transport_event(TransportEvent::MessageReceived {
                from: PeerId::new("watch"),
                payload: REFRESH_COMMAND.to_vec(),
            })
            .await;
        assert_eq!(transport.puts().len(), puts_before + 1);
    }

    #[tokio::test]
    async fn connect_failure_waits_for_the_next_wake() {
        let transport = MockTransport::new();
        transport.fail_next_connect("transport unavailable");
        let mut service = companion_over(&transport);

        assert!(service.on_command(Command::Start).await);
        assert_eq!(service.phase(), Phase::Idle);
        assert!(matches!(service.session_state(), SessionState::Failed(_)));

        // Next wake retries
        assert!(service.on_command(Command::Start).await);
        assert_eq!(service.phase(), Phase::Connecting);
        assert_eq!(transport.connect_calls(), 2);
    }

    #[tokio::test]
    async fn shutdown_tears_the_session_down() {
        let transport = MockTransport::new();
        let mut service = companion_over(&transport);
        bring_ready(&mut service).await;

        let keep_running = service.on_command(Command::Shutdown).await;

        assert!(!keep_running);
        assert_eq!(service.phase(), Phase::Idle);
        assert!(!transport.is_connected());
        assert!(!transport.listeners_registered());
    }

    #[tokio::test]
    async fn run_drives_the_service_until_shutdown() {
        let transport = MockTransport::new();
        let service = primary_over(&transport, Arc::new(FixedStore(forecast(800, 23.0, 19.0))));

        let (handle, commands) = ServiceHandle::channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let join = tokio::spawn(service.run(events, commands));

        event_tx.send(TransportEvent::Connected).unwrap();
        for _ in 0..1000 {
            if !transport.puts().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.puts().len(), 1);

        handle.shutdown();
        join.await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn closed_event_stream_stops_the_service() {
        let transport = MockTransport::new();
        let service = companion_over(&transport);

        let (_handle, commands) = ServiceHandle::channel();
        let (event_tx, events) = mpsc::unbounded_channel::<TransportEvent>();
        let join = tokio::spawn(service.run(events, commands));

        drop(event_tx);
        join.await.unwrap();
        assert!(!transport.is_connected());
    }
}
