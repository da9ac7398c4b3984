//! Per-camera connection lifecycle.
//!
//! One [`ConnectionManager`] owns one camera's stream connection and its
//! bounded reconnect loop. Callers drive it from a single thread by calling
//! [`ConnectionManager::poll`] on their tick; transport reader threads only
//! ever touch the event channel.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::config::{Backoff, StreamConfig};
use crate::router::MessageRouter;
use crate::transport::{Connector, TransportEvent, TransportHandle};
use crossbeam_channel::{Receiver, TryRecvError};
use log::{info, warn};
use std::time::Instant;

/// Lifecycle states for one camera connection.
///
/// `Error` is a transient state with a reconnect pending (unless retries are
/// exhausted, which lands in `MaxRetries`). `MaxRetries` is terminal until an
/// explicit [`ConnectionManager::retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
    MaxRetries,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
            ConnectionState::MaxRetries => "max_retries",
        }
    }
}

/// Called on every state change with the new state.
pub type StateObserver = Box<dyn FnMut(ConnectionState)>;

/// Token returned by [`ConnectionManager::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

pub struct ConnectionManager {
    camera_id: String,
    endpoint: String,
    max_retries: u32,
    retry_delay: Backoff,
    connector: Box<dyn Connector>,
    state: ConnectionState,
    attempts: u32,
    handle: Option<Box<dyn TransportHandle>>,
    events: Option<Receiver<TransportEvent>>,
    reconnect_at: Option<Instant>,
    observers: Vec<(u64, StateObserver)>,
    next_observer: u64,
}

impl ConnectionManager {
    pub fn new(camera_id: String, config: &StreamConfig, connector: Box<dyn Connector>) -> Self {
        let endpoint = config.endpoint_for(&camera_id);
        Self {
            camera_id,
            endpoint,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            connector,
            state: ConnectionState::Disconnected,
            attempts: 0,
            handle: None,
            events: None,
            reconnect_at: None,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn subscribe(&mut self, observer: StateObserver) -> ObserverId {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, observer));
        ObserverId(id)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) {
        self.observers.retain(|(oid, _)| *oid != id.0);
    }

    /// Opens a fresh transport, replacing any existing one. A failed open
    /// counts as a transport failure and schedules a reconnect.
    pub fn connect(&mut self) {
        self.teardown_transport();
        self.reconnect_at = None;
        self.set_state(ConnectionState::Connecting);

        match self.connector.open(&self.endpoint) {
            Ok((handle, events)) => {
                self.handle = Some(handle);
                self.events = Some(events);
            }
            Err(e) => {
                warn!("[{}] stream connect failed: {e}", self.camera_id);
                self.on_transport_failure(Instant::now());
            }
        }
    }

    /// Tears down the transport and cancels any pending reconnect.
    pub fn disconnect(&mut self) {
        self.teardown_transport();
        self.reconnect_at = None;
        self.attempts = 0;
        self.set_state(ConnectionState::Disconnected);
    }

    /// Manual restart after retries are exhausted (or at any time). Resets
    /// the failure counter and connects immediately.
    pub fn retry(&mut self) {
        self.attempts = 0;
        self.reconnect_at = None;
        self.connect();
    }

    /// Drives the reconnect timer and drains pending transport events,
    /// handing messages to `router`.
    pub fn poll(&mut self, now: Instant, router: &mut MessageRouter) {
        if self.state == ConnectionState::Error {
            if let Some(due) = self.reconnect_at {
                if now >= due {
                    self.reconnect_at = None;
                    self.attempts += 1;
                    self.connect();
                }
            }
        }

        loop {
            let event = match &self.events {
                Some(rx) => match rx.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                },
                None => break,
            };

            match event {
                TransportEvent::Opened => {
                    self.attempts = 0;
                    self.set_state(ConnectionState::Connected);
                }
                TransportEvent::Message(raw) => router.dispatch(&raw),
                TransportEvent::Closed => {
                    self.on_transport_failure(now);
                }
                TransportEvent::Error(e) => {
                    warn!("[{}] stream transport error: {e}", self.camera_id);
                    self.on_transport_failure(now);
                }
            }
        }
    }

    fn teardown_transport(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.shutdown();
        }
        // Dropping the receiver discards anything a torn-down transport
        // still sends.
        self.events = None;
    }

    fn on_transport_failure(&mut self, now: Instant) {
        self.teardown_transport();
        self.set_state(ConnectionState::Error);

        if self.attempts >= self.max_retries {
            self.set_state(ConnectionState::MaxRetries);
        } else {
            self.reconnect_at = Some(now + self.retry_delay.delay_for(self.attempts));
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        info!(
            "[{}] stream {} -> {}",
            self.camera_id,
            self.state.as_str(),
            state.as_str()
        );
        self.state = state;
        for (_, observer) in &mut self.observers {
            observer(state);
        }
    }
}
