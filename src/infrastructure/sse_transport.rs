// Reconnecting Server-Sent Events transport on reqwest-eventsource
use crate::application::event_transport::{EventTransport, SseEvent, TransportEvent, TransportStream};
use futures::StreamExt;
use reqwest::header::CACHE_CONTROL;
use reqwest_eventsource::retry::RetryPolicy;
use reqwest_eventsource::{Error as SourceError, Event, EventSource};
use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_RETRY: Duration = Duration::from_millis(2000);
const DEFAULT_EVENT: &str = "message";

/// Reconnect after a fixed delay, which the server may change with `retry:`.
///
/// A 4xx status or a non event-stream content type closes the stream for
/// good: the URL is wrong and asking again will not fix it. Everything else
/// (refused connections, 5xx while the server restarts, a dropped stream)
/// is retried indefinitely.
#[derive(Debug, Clone)]
struct StreamRetry {
    delay: Duration,
}

impl RetryPolicy for StreamRetry {
    fn retry(&self, error: &SourceError, _last_retry: Option<(usize, Duration)>) -> Option<Duration> {
        match error {
            SourceError::InvalidStatusCode(status, _) if status.is_client_error() => None,
            SourceError::InvalidContentType(..) => None,
            _ => Some(self.delay),
        }
    }

    fn set_reconnection_time(&mut self, duration: Duration) {
        self.delay = duration;
    }
}

#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
    retry: Duration,
    capacity: usize,
}

impl SseTransport {
    pub fn new(retry: Duration, capacity: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            retry,
            capacity: capacity.max(1),
        }
    }
}

impl Default for SseTransport {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY, 64)
    }
}

impl EventTransport for SseTransport {
    fn subscribe(&self, url: &str) -> TransportStream {
        let (tx, rx) = mpsc::channel(self.capacity);
        let request = self.client.get(url).header(CACHE_CONTROL, "no-cache");

        let task = match EventSource::new(request) {
            Ok(mut source) => {
                source.set_retry_policy(Box::new(StreamRetry { delay: self.retry }));
                Some(tokio::spawn(run(source, url.to_string(), tx)))
            }
            Err(e) => {
                tracing::warn!("Cannot open stream {}: {}", url, e);
                None
            }
        };
        TransportStream::new(rx, task)
    }
}

async fn run(mut source: EventSource, url: String, tx: mpsc::Sender<TransportEvent>) {
    while let Some(event) = source.next().await {
        let out = match event {
            Ok(Event::Open) => TransportEvent::Open,
            Ok(Event::Message(message)) => TransportEvent::Message(SseEvent {
                event: if message.event.is_empty() {
                    DEFAULT_EVENT.to_string()
                } else {
                    message.event
                },
                data: message.data,
                id: Some(message.id).filter(|id| !id.is_empty()),
            }),
            Err(e) => {
                tracing::debug!("Stream {} interrupted: {}", url, e);
                TransportEvent::Error(e.to_string())
            }
        };
        if tx.send(out).await.is_err() {
            source.close();
            return;
        }
    }
    tracing::warn!("Stream {} closed, not reconnecting", url);
}
