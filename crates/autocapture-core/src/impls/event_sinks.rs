//! EventSink implementations.

use tokio::sync::mpsc;

use crate::domain::EngineEvent;
use crate::ports::EventSink;

/// Forwards every event to `tracing` under the `autocapture::events` target.
///
/// Failures and restarts go out at `warn`, everything else at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: EngineEvent) {
        match &event {
            EngineEvent::Failure { .. } | EngineEvent::Restarting { .. } => {
                tracing::warn!(target: "autocapture::events", "{event}");
            }
            _ => tracing::info!(target: "autocapture::events", "{event}"),
        }
    }
}

/// Forwards events into an unbounded channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        // receiver may already be dropped
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelEventSink::new();
        sink.emit(EngineEvent::Started);
        sink.emit(EngineEvent::Stopped);
        assert_eq!(rx.recv().await, Some(EngineEvent::Started));
        assert_eq!(rx.recv().await, Some(EngineEvent::Stopped));
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelEventSink::new();
        drop(rx);
        sink.emit(EngineEvent::Started);
    }
}
