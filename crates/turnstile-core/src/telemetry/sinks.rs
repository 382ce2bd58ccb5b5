//! Telemetry sink implementations

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::events::{EventKind, TelemetryEvent};

/// Receives telemetry events; must not block
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: &TelemetryEvent);
}

/// Adapts a closure into a sink
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(&TelemetryEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> TelemetrySink for FnSink<F>
where
    F: Fn(&TelemetryEvent) + Send + Sync,
{
    fn emit(&self, event: &TelemetryEvent) {
        (self.0)(event)
    }
}

/// Forwards events over an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<TelemetryEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TelemetryEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TelemetrySink for ChannelSink {
    fn emit(&self, event: &TelemetryEvent) {
        // A dropped receiver only means nobody is listening anymore
        let _ = self.sender.send(event.clone());
    }
}

/// Keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&self, event: &TelemetryEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::BudgetNumbers;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(kind: EventKind) -> TelemetryEvent {
        TelemetryEvent {
            kind,
            model: "m".to_string(),
            attempt: 0,
            budget: BudgetNumbers::default(),
            selected: Vec::new(),
            trimmed_internal: 1,
            trimmed_provider: 2,
            error: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_fn_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sink = FnSink::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        sink.emit(&event(EventKind::Preflight));
        sink.emit(&event(EventKind::Attempt));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (sink, mut receiver) = ChannelSink::new();
        sink.emit(&event(EventKind::Success));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.kind, EventKind::Success);
        assert_eq!(received.trimmed_total(), 3);
    }

    #[test]
    fn test_channel_sink_without_receiver() {
        let (sink, receiver) = ChannelSink::new();
        drop(receiver);
        sink.emit(&event(EventKind::Error));
    }

    #[test]
    fn test_recording_sink_shares_buffer() {
        let sink = RecordingSink::new();
        let clone = sink.clone();
        clone.emit(&event(EventKind::Preflight));
        assert_eq!(sink.kinds(), vec![EventKind::Preflight]);
    }
}
