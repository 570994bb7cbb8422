//! Event channel consumed by an embedding UI.
//!
//! A single FIFO of UTF-8 lines. The channel is unbounded and sends are
//! fire-and-forget: the crawl never blocks on (or fails because of) a
//! missing consumer.

use tokio::sync::mpsc;

/// Producer half of the event channel.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<String>,
}

impl EventSink {
    /// Create a sink and the receiver an embedding UI drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// A sink whose lines go nowhere; for embedders without a UI.
    #[must_use]
    pub fn discard() -> Self {
        let (sink, _rx) = Self::channel();
        sink
    }

    /// Emit one line. Dropped receivers are ignored.
    pub fn emit(&self, line: impl Into<String>) {
        let _ = self.tx.send(line.into());
    }
}
