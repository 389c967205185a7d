//! Live-update channel.
//!
//! One persistent duplex connection per application, carrying directory
//! change notifications for subscribed paths. The channel connects lazily
//! on the first subscription and reconnects with exponential backoff while
//! anything is subscribed, and closes as soon as the last subscription goes
//! away. The explorer subscribes a new directory before releasing the old
//! one, so moving between directories keeps the socket open.
//!
//! The channel never sleeps or spawns on its own. The owner drives it:
//!
//! - forwards transport events to [`LiveChannel::on_open`],
//!   [`LiveChannel::on_close`] and [`LiveChannel::on_message`]
//! - waits out [`LiveChannel::take_reconnect_delay`] and then calls
//!   [`LiveChannel::reconnect`]
//!
//! Transport events carry the generation number passed to
//! [`LiveTransport::open`], so events from a socket that has since been
//! replaced are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DirectoryCache;
use crate::config::LiveConfig;
use crate::error::ExplorerError;
use crate::models::{ChangeKind, ConnectionId, Delta, EntryPayload};
use crate::path::RemotePath;

// =============================================================================
// Wire Protocol
// =============================================================================

/// Messages sent to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { connection_id: ConnectionId, path: String },
    Unsubscribe { connection_id: ConnectionId, path: String },
    Ping,
}

impl ClientMessage {
    fn subscribe(connection: &ConnectionId, path: &RemotePath) -> Self {
        Self::Subscribe {
            connection_id: connection.clone(),
            path: path.to_query(),
        }
    }

    fn unsubscribe(connection: &ConnectionId, path: &RemotePath) -> Self {
        Self::Unsubscribe {
            connection_id: connection.clone(),
            path: path.to_query(),
        }
    }
}

/// Messages received from the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Subscribed { connection_id: ConnectionId, path: String },
    Unsubscribed { connection_id: ConnectionId, path: String },
    Pong,
    /// Something in the directory changed; details unknown.
    DirectoryChanged { connection_id: ConnectionId, path: String },
    /// A single entry changed.
    EntryChanged {
        connection_id: ConnectionId,
        path: String,
        change: ChangeKind,
        entry_name: String,
        #[serde(default)]
        previous_name: Option<String>,
        #[serde(default)]
        entry: Option<EntryPayload>,
    },
}

// =============================================================================
// Transport
// =============================================================================

/// Message-based duplex transport (a WebSocket in the browser).
pub trait LiveTransport {
    /// Begin connecting. Completion is reported through
    /// [`LiveChannel::on_open`] / [`LiveChannel::on_close`] with the same
    /// `generation`.
    fn open(&mut self, generation: u64) -> Result<(), ExplorerError>;

    fn send(&mut self, message: &ClientMessage) -> Result<(), ExplorerError>;

    fn close(&mut self);
}

/// Connection state of the live channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

// =============================================================================
// Backoff
// =============================================================================

/// Exponential reconnect delay with an upper bound.
#[derive(Clone, Debug)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    attempt: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max: max.max(initial),
            multiplier: multiplier.max(1.0),
            attempt: 0,
        }
    }

    pub fn from_config(config: &LiveConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
            config.backoff_multiplier,
        )
    }

    /// Delay before the next attempt; grows with every call.
    pub fn next_delay(&mut self) -> Duration {
        let factor = self.multiplier.powi(self.attempt.min(32) as i32);
        let millis = (self.initial.as_millis() as f64 * factor).min(self.max.as_millis() as f64);
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(millis as u64)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

// =============================================================================
// LiveChannel
// =============================================================================

/// Outcome of handling one server message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiveEvent {
    /// A delta was applied to a cached listing.
    Applied { connection: ConnectionId, path: RemotePath },
    /// The listing is stale and should be revalidated.
    Invalidated { connection: ConnectionId, path: RemotePath },
    /// The message referred to a path that is not cached.
    Dropped,
    Acknowledged,
    Pong,
    /// Unparseable or from an outdated connection.
    Ignored,
}

#[derive(Clone, Debug)]
struct Subscription {
    connection: ConnectionId,
    path: RemotePath,
    refs: usize,
}

/// Ref-counted subscription manager and connection state machine.
pub struct LiveChannel<T> {
    transport: T,
    state: ChannelState,
    generation: u64,
    subscriptions: Vec<Subscription>,
    backoff: Backoff,
    scheduled: Option<Duration>,
}

impl<T: LiveTransport> LiveChannel<T> {
    pub fn new(transport: T, config: &LiveConfig) -> Self {
        Self {
            transport,
            state: ChannelState::Disconnected,
            generation: 0,
            subscriptions: Vec::new(),
            backoff: Backoff::from_config(config),
            scheduled: None,
        }
    }

    #[inline]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Generation of the current (or most recent) connection attempt.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Number of distinct subscribed paths.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_subscribed(&self, connection: &ConnectionId, path: &RemotePath) -> bool {
        self.position(connection, path).is_some()
    }

    /// Fails with [`ExplorerError::ChannelDisconnected`] unless connected.
    pub fn ensure_connected(&self) -> Result<(), ExplorerError> {
        match self.state {
            ChannelState::Connected => Ok(()),
            _ => Err(ExplorerError::ChannelDisconnected),
        }
    }

    pub fn subscribe(&mut self, connection: &ConnectionId, path: &RemotePath) {
        if let Some(idx) = self.position(connection, path) {
            self.subscriptions[idx].refs += 1;
            return;
        }

        self.subscriptions.push(Subscription {
            connection: connection.clone(),
            path: path.clone(),
            refs: 1,
        });
        log::info!("subscribed to {}:{}", connection, path);

        match self.state {
            ChannelState::Connected => self.send(&ClientMessage::subscribe(connection, path)),
            ChannelState::Connecting => {}
            ChannelState::Disconnected => {
                // A pending reconnect timer will pick the new path up.
                if self.scheduled.is_none() && self.backoff.attempts() == 0 {
                    self.connect();
                }
            }
        }
    }

    pub fn unsubscribe(&mut self, connection: &ConnectionId, path: &RemotePath) {
        let Some(idx) = self.position(connection, path) else {
            return;
        };
        self.subscriptions[idx].refs -= 1;
        if self.subscriptions[idx].refs > 0 {
            return;
        }

        self.subscriptions.remove(idx);
        log::info!("unsubscribed from {}:{}", connection, path);

        if self.state == ChannelState::Connected {
            self.send(&ClientMessage::unsubscribe(connection, path));
        }
        if self.subscriptions.is_empty() {
            self.shut_down();
        }
    }

    /// Close the connection and drop any pending reconnect.
    fn shut_down(&mut self) {
        if self.state != ChannelState::Disconnected {
            log::info!("closing live channel (no subscriptions)");
            self.transport.close();
        }
        self.state = ChannelState::Disconnected;
        self.generation += 1;
        self.backoff.reset();
        self.scheduled = None;
    }

    /// Transport finished connecting.
    pub fn on_open(&mut self, generation: u64) {
        if generation != self.generation || self.state != ChannelState::Connecting {
            return;
        }
        log::info!("live channel connected");
        self.state = ChannelState::Connected;
        self.backoff.reset();
        self.scheduled = None;

        let messages: Vec<ClientMessage> = self
            .subscriptions
            .iter()
            .map(|s| ClientMessage::subscribe(&s.connection, &s.path))
            .collect();
        for message in &messages {
            self.send(message);
        }
    }

    /// Transport dropped. Returns the reconnect delay if one was scheduled.
    pub fn on_close(&mut self, generation: u64) -> Option<Duration> {
        if generation != self.generation || self.state == ChannelState::Disconnected {
            return None;
        }
        self.state = ChannelState::Disconnected;
        log::warn!("live channel disconnected");
        self.schedule_reconnect()
    }

    /// Take the pending reconnect delay, if any. The owner should wait for
    /// it and then call [`LiveChannel::reconnect`].
    pub fn take_reconnect_delay(&mut self) -> Option<Duration> {
        self.scheduled.take()
    }

    /// Reconnect after a backoff wait. No-op if nothing is subscribed or a
    /// connection already exists.
    pub fn reconnect(&mut self) {
        if self.state != ChannelState::Disconnected {
            return;
        }
        if self.subscriptions.is_empty() {
            self.backoff.reset();
        } else {
            self.connect();
        }
    }

    /// Periodic tick: ping while connected.
    pub fn heartbeat(&mut self) {
        if self.state == ChannelState::Connected {
            self.send(&ClientMessage::Ping);
        }
    }

    /// Parse and apply one text frame.
    pub fn on_message(
        &mut self,
        generation: u64,
        text: &str,
        cache: &mut DirectoryCache,
    ) -> LiveEvent {
        if generation != self.generation {
            return LiveEvent::Ignored;
        }
        match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => self.handle(message, cache),
            Err(e) => {
                log::warn!("ignoring malformed live message: {}", e);
                LiveEvent::Ignored
            }
        }
    }

    /// Apply one decoded server message.
    pub fn handle(&mut self, message: ServerMessage, cache: &mut DirectoryCache) -> LiveEvent {
        match message {
            ServerMessage::Subscribed { .. } | ServerMessage::Unsubscribed { .. } => {
                LiveEvent::Acknowledged
            }
            ServerMessage::Pong => LiveEvent::Pong,
            ServerMessage::DirectoryChanged {
                connection_id,
                path,
            } => {
                let Some(path) = parse_path(&path) else {
                    return LiveEvent::Ignored;
                };
                if cache.invalidate(&connection_id, &path) {
                    LiveEvent::Invalidated {
                        connection: connection_id,
                        path,
                    }
                } else {
                    LiveEvent::Dropped
                }
            }
            ServerMessage::EntryChanged {
                connection_id,
                path,
                change,
                entry_name,
                previous_name,
                entry,
            } => {
                let Some(path) = parse_path(&path) else {
                    return LiveEvent::Ignored;
                };
                let delta = Delta {
                    change,
                    entry_name,
                    previous_name,
                    entry: entry.and_then(EntryPayload::into_entry),
                };

                // Creates and updates need the full record; without it the
                // listing can only be revalidated.
                let needs_record = matches!(change, ChangeKind::Created | ChangeKind::Updated);
                if needs_record && delta.entry.is_none() {
                    return if cache.invalidate(&connection_id, &path) {
                        LiveEvent::Invalidated {
                            connection: connection_id,
                            path,
                        }
                    } else {
                        LiveEvent::Dropped
                    };
                }

                if cache.apply_delta(&connection_id, &path, &delta) {
                    LiveEvent::Applied {
                        connection: connection_id,
                        path,
                    }
                } else {
                    LiveEvent::Dropped
                }
            }
        }
    }

    fn position(&self, connection: &ConnectionId, path: &RemotePath) -> Option<usize> {
        self.subscriptions
            .iter()
            .position(|s| &s.connection == connection && &s.path == path)
    }

    fn connect(&mut self) {
        self.generation += 1;
        self.state = ChannelState::Connecting;
        log::debug!("opening live channel (generation {})", self.generation);
        if let Err(e) = self.transport.open(self.generation) {
            log::warn!("live channel failed to open: {}", e);
            self.state = ChannelState::Disconnected;
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) -> Option<Duration> {
        if self.subscriptions.is_empty() {
            self.backoff.reset();
            self.scheduled = None;
            return None;
        }
        let delay = self.backoff.next_delay();
        log::info!("reconnecting live channel in {:?}", delay);
        self.scheduled = Some(delay);
        self.scheduled
    }

    fn send(&mut self, message: &ClientMessage) {
        if let Err(e) = self.transport.send(message) {
            log::warn!("live channel send failed: {}", e);
        }
    }
}

fn parse_path(raw: &str) -> Option<RemotePath> {
    RemotePath::normalize(raw)
        .map_err(|e| log::warn!("live message with invalid path {:?}: {}", raw, e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DirectoryListing, Entry};

    #[derive(Default)]
    struct FakeTransport {
        opened: Vec<u64>,
        sent: Vec<ClientMessage>,
        closed: usize,
        fail_open: bool,
    }

    impl LiveTransport for FakeTransport {
        fn open(&mut self, generation: u64) -> Result<(), ExplorerError> {
            self.opened.push(generation);
            if self.fail_open {
                Err(ExplorerError::ChannelDisconnected)
            } else {
                Ok(())
            }
        }

        fn send(&mut self, message: &ClientMessage) -> Result<(), ExplorerError> {
            self.sent.push(message.clone());
            Ok(())
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    fn channel() -> LiveChannel<FakeTransport> {
        LiveChannel::new(FakeTransport::default(), &LiveConfig::default())
    }

    fn conn() -> ConnectionId {
        ConnectionId::new("c1")
    }

    fn path(raw: &str) -> RemotePath {
        RemotePath::normalize(raw).unwrap()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[test]
    fn test_connects_lazily_and_resubscribes_on_open() {
        let mut live = channel();
        assert!(live.transport().opened.is_empty());

        live.subscribe(&conn(), &path("/docs"));
        assert_eq!(live.state(), ChannelState::Connecting);
        assert_eq!(live.transport().opened.len(), 1);
        assert!(live.transport().sent.is_empty());

        live.on_open(live.generation());
        assert_eq!(live.state(), ChannelState::Connected);
        assert_eq!(
            live.transport().sent,
            vec![ClientMessage::Subscribe {
                connection_id: conn(),
                path: "docs".into()
            }]
        );
    }

    #[test]
    fn test_ref_counted_subscriptions() {
        let mut live = channel();
        live.subscribe(&conn(), &path("/a"));
        live.on_open(live.generation());
        live.subscribe(&conn(), &path("/a"));
        assert_eq!(live.subscription_count(), 1);
        assert_eq!(live.transport().sent.len(), 1);

        live.unsubscribe(&conn(), &path("/a"));
        assert!(live.is_subscribed(&conn(), &path("/a")));
        live.unsubscribe(&conn(), &path("/a"));
        assert!(!live.is_subscribed(&conn(), &path("/a")));
        assert_eq!(
            live.transport().sent.last(),
            Some(&ClientMessage::Unsubscribe {
                connection_id: conn(),
                path: "a".into()
            })
        );
    }

    #[test]
    fn test_last_unsubscribe_closes_channel() {
        let mut live = channel();
        live.subscribe(&conn(), &path("/a"));
        live.on_open(live.generation());

        // Subscribing the next path first keeps the socket
        live.subscribe(&conn(), &path("/b"));
        live.unsubscribe(&conn(), &path("/a"));
        assert_eq!(live.state(), ChannelState::Connected);
        assert_eq!(live.transport().closed, 0);
        assert_eq!(live.transport().opened.len(), 1);

        live.unsubscribe(&conn(), &path("/b"));
        assert_eq!(live.transport().closed, 1);
        assert_eq!(live.state(), ChannelState::Disconnected);
        assert!(live.ensure_connected().is_err());
    }

    #[test]
    fn test_unsubscribe_while_connecting_closes() {
        let mut live = channel();
        live.subscribe(&conn(), &path("/a"));
        let generation = live.generation();
        assert_eq!(live.state(), ChannelState::Connecting);

        live.unsubscribe(&conn(), &path("/a"));
        assert_eq!(live.state(), ChannelState::Disconnected);
        assert_eq!(live.transport().closed, 1);

        // Late open from the abandoned socket
        live.on_open(generation);
        assert_eq!(live.state(), ChannelState::Disconnected);
    }

    #[test]
    fn test_reconnect_backoff_doubles_and_resets() {
        let mut live = channel();
        live.subscribe(&conn(), &path("/a"));

        let first = live.on_close(live.generation());
        assert_eq!(first, Some(Duration::from_millis(1_000)));
        assert_eq!(live.take_reconnect_delay(), first);

        live.reconnect();
        assert_eq!(live.state(), ChannelState::Connecting);
        let second = live.on_close(live.generation());
        assert_eq!(second, Some(Duration::from_millis(2_000)));

        live.reconnect();
        live.on_open(live.generation());
        live.take_reconnect_delay();
        let after_reset = live.on_close(live.generation());
        assert_eq!(after_reset, Some(Duration::from_millis(1_000)));
    }

    #[test]
    fn test_backoff_is_bounded() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(500), 2.0);
        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_millis() as u64).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn test_no_reconnect_without_subscriptions() {
        let mut live = channel();
        live.subscribe(&conn(), &path("/a"));
        live.on_open(live.generation());
        let generation = live.generation();
        live.unsubscribe(&conn(), &path("/a"));
        assert_eq!(live.transport().closed, 1);
        // Close event from the socket we shut down
        assert_eq!(live.on_close(generation), None);
        live.reconnect();
        assert_eq!(live.transport().opened.len(), 1);
    }

    #[test]
    fn test_stale_generation_events_ignored() {
        let mut live = channel();
        live.subscribe(&conn(), &path("/a"));
        let old = live.generation();
        live.on_close(old);
        live.take_reconnect_delay();
        live.reconnect();
        assert_ne!(live.generation(), old);

        live.on_open(old);
        assert_eq!(live.state(), ChannelState::Connecting);
        live.on_open(live.generation());
        assert_eq!(live.state(), ChannelState::Connected);
    }

    #[test]
    fn test_failed_open_schedules_retry() {
        let mut live = LiveChannel::new(
            FakeTransport {
                fail_open: true,
                ..Default::default()
            },
            &LiveConfig::default(),
        );
        live.subscribe(&conn(), &path("/a"));
        assert_eq!(live.state(), ChannelState::Disconnected);
        assert_eq!(live.take_reconnect_delay(), Some(Duration::from_millis(1_000)));
        assert!(live.ensure_connected().is_err());
    }

    #[test]
    fn test_heartbeat_only_when_connected() {
        let mut live = channel();
        live.heartbeat();
        live.subscribe(&conn(), &path("/a"));
        live.heartbeat();
        assert!(live.transport().sent.is_empty());
        live.on_open(live.generation());
        live.heartbeat();
        assert_eq!(live.transport().sent.last(), Some(&ClientMessage::Ping));
    }

    // =========================================================================
    // Messages
    // =========================================================================

    #[test]
    fn test_client_message_wire_format() {
        let json = serde_json::to_string(&ClientMessage::subscribe(&conn(), &path("/a/b"))).unwrap();
        assert_eq!(
            json,
            r#"{"action":"subscribe","connection_id":"c1","path":"a/b"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientMessage::Ping).unwrap(),
            r#"{"action":"ping"}"#
        );
    }

    #[test]
    fn test_entry_changed_applies_delta() {
        let mut live = channel();
        let mut cache = DirectoryCache::new(4);
        cache.put(
            &conn(),
            &path("/docs"),
            DirectoryListing::new(path("/docs"), vec![Entry::file("notes.txt", 1)]),
        );
        let text = r#"{"type":"entry_changed","connection_id":"c1","path":"docs",
                       "change":"removed","entry_name":"notes.txt"}"#;

        let event = live.on_message(live.generation(), text, &mut cache);
        assert_eq!(
            event,
            LiveEvent::Applied {
                connection: conn(),
                path: path("/docs")
            }
        );
        assert_eq!(cache.get(&conn(), &path("/docs")).unwrap().listing.total, 0);
    }

    #[test]
    fn test_directory_changed_invalidates() {
        let mut live = channel();
        let mut cache = DirectoryCache::new(4);
        cache.put(&conn(), &path("/"), DirectoryListing::new(path("/"), vec![]));

        let text = r#"{"type":"directory_changed","connection_id":"c1","path":""}"#;
        let event = live.on_message(live.generation(), text, &mut cache);
        assert!(matches!(event, LiveEvent::Invalidated { .. }));
        assert!(cache.get(&conn(), &path("/")).unwrap().stale);

        let unknown = r#"{"type":"directory_changed","connection_id":"c1","path":"elsewhere"}"#;
        assert_eq!(
            live.on_message(live.generation(), unknown, &mut cache),
            LiveEvent::Dropped
        );
    }

    #[test]
    fn test_update_without_record_invalidates() {
        let mut live = channel();
        let mut cache = DirectoryCache::new(4);
        cache.put(&conn(), &path("/"), DirectoryListing::new(path("/"), vec![]));
        let text = r#"{"type":"entry_changed","connection_id":"c1","path":"/",
                       "change":"updated","entry_name":"a"}"#;
        let event = live.on_message(live.generation(), text, &mut cache);
        assert!(matches!(event, LiveEvent::Invalidated { .. }));
    }

    #[test]
    fn test_malformed_and_pong() {
        let mut live = channel();
        let mut cache = DirectoryCache::new(4);
        assert_eq!(
            live.on_message(live.generation(), "not json", &mut cache),
            LiveEvent::Ignored
        );
        assert_eq!(
            live.on_message(live.generation(), r#"{"type":"pong"}"#, &mut cache),
            LiveEvent::Pong
        );
    }
}
