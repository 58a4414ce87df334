// Event transport trait - the reconnecting server-to-client push channel
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One dispatched event from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name; `message` when the server did not name it.
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    pub fn named(event: &str, data: &str) -> Self {
        Self {
            event: event.to_string(),
            data: data.to_string(),
            id: None,
        }
    }
}

/// Transport lifecycle, as the transport itself reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    /// Interruption or failed (re)connect. The transport keeps retrying.
    Error(String),
    Message(SseEvent),
}

/// Receiving end of a subscription. Dropping it stops the transport task.
pub struct TransportStream {
    events: mpsc::Receiver<TransportEvent>,
    task: Option<JoinHandle<()>>,
}

impl TransportStream {
    pub fn new(events: mpsc::Receiver<TransportEvent>, task: Option<JoinHandle<()>>) -> Self {
        Self { events, task }
    }

    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }
}

impl Drop for TransportStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub trait EventTransport {
    /// Start delivering events for `url`. Reconnection is the transport's job.
    fn subscribe(&self, url: &str) -> TransportStream;
}
