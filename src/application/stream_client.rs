// Stream client - owns the single devices subscription and turns transport
// lifecycle into connection state and typed events
use crate::application::event_transport::{EventTransport, SseEvent, TransportEvent, TransportStream};
use crate::domain::connection::ConnectionState;
use crate::domain::snapshot::{FleetSnapshot, ServerDiagnostic};
use thiserror::Error;

pub const DEVICES_EVENT: &str = "devices";
pub const ERROR_EVENT: &str = "error";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("a devices subscription is already open for {0}")]
    AlreadyOpen(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connection(ConnectionState),
    Snapshot(FleetSnapshot),
    Diagnostic(ServerDiagnostic),
}

pub struct StreamClient<T: EventTransport> {
    transport: T,
    opened: Option<String>,
}

impl<T: EventTransport> StreamClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            opened: None,
        }
    }

    /// Open the one subscription this client will ever own.
    pub fn open(&mut self, channel_url: &str) -> Result<Subscription, StreamError> {
        if let Some(url) = &self.opened {
            return Err(StreamError::AlreadyOpen(url.clone()));
        }
        tracing::info!("Opening devices stream at {}", channel_url);
        self.opened = Some(channel_url.to_string());
        Ok(Subscription::new(self.transport.subscribe(channel_url)))
    }
}

pub struct Subscription {
    stream: TransportStream,
    state: ConnectionState,
}

impl Subscription {
    pub fn new(stream: TransportStream) -> Self {
        Self {
            stream,
            state: ConnectionState::Connecting,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Next typed event, in transport order. Undecodable payloads are
    /// skipped here and never reach the caller. `None` once the transport
    /// has shut down.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        loop {
            let event = self.stream.recv().await?;
            if let Some(out) = self.translate(event) {
                return Some(out);
            }
        }
    }

    fn translate(&mut self, event: TransportEvent) -> Option<StreamEvent> {
        match event {
            TransportEvent::Open => self.set_state(ConnectionState::Connected),
            TransportEvent::Error(reason) => {
                tracing::debug!("Devices stream interrupted: {}", reason);
                self.set_state(ConnectionState::Reconnecting)
            }
            TransportEvent::Message(message) => Self::decode(message),
        }
    }

    // Level-triggered: every signal sets the state, only changes are reported.
    fn set_state(&mut self, next: ConnectionState) -> Option<StreamEvent> {
        let changed = self.state != next;
        self.state = next;
        changed.then_some(StreamEvent::Connection(next))
    }

    fn decode(message: SseEvent) -> Option<StreamEvent> {
        match message.event.as_str() {
            DEVICES_EVENT => match FleetSnapshot::from_json(&message.data) {
                Ok(snapshot) => Some(StreamEvent::Snapshot(snapshot)),
                Err(e) => {
                    tracing::debug!("Dropping devices event: {}", e);
                    None
                }
            },
            ERROR_EVENT => match ServerDiagnostic::from_json(&message.data) {
                Ok(diagnostic) => {
                    tracing::warn!("Server reported error: {}", diagnostic);
                    Some(StreamEvent::Diagnostic(diagnostic))
                }
                Err(e) => {
                    tracing::debug!("Dropping error event: {}", e);
                    None
                }
            },
            other => {
                tracing::trace!("Ignoring {} event", other);
                None
            }
        }
    }
}
