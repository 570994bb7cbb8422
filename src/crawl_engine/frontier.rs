//! Bounded multi-producer frontier shared by all workers.
//!
//! A tokio mpsc channel with the receiver behind an async mutex: sends
//! block when the queue is full (correct behavior, not an error), and
//! any worker may dequeue. Snapshots drain the queue and rebuild it.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::utils::constants::FRONTIER_CAPACITY;

pub struct Frontier {
    tx: mpsc::Sender<String>,
    rx: tokio::sync::Mutex<mpsc::Receiver<String>>,
}

impl Frontier {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(FRONTIER_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Enqueue a canonical URL, blocking while the frontier is full.
    ///
    /// Returns false when cancellation wins the race (or the channel is
    /// gone); the caller must then give back its outstanding-work unit.
    pub async fn push(&self, url: String, cancel: &CancellationToken) -> bool {
        tokio::select! {
            result = self.tx.send(url) => result.is_ok(),
            () = cancel.cancelled() => false,
        }
    }

    /// Dequeue the next URL, waiting while the frontier is empty.
    ///
    /// Callers race this against the cancellation and work-done tokens;
    /// dropping the future releases the receiver for other workers.
    pub async fn pop(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }

    /// Current queue length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain every queued URL without waiting.
    ///
    /// Used by the snapshot writer once workers are quiescent.
    pub async fn drain(&self) -> Vec<String> {
        let mut rx = self.rx.lock().await;
        let mut drained = Vec::new();
        while let Ok(url) = rx.try_recv() {
            drained.push(url);
        }
        drained
    }

    /// Push a drained slice back, preserving order.
    pub async fn restore(&self, urls: Vec<String>, cancel: &CancellationToken) {
        for url in urls {
            if !self.push(url, cancel).await {
                break;
            }
        }
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fifo_order() {
        let frontier = Frontier::with_capacity(10);
        let cancel = CancellationToken::new();
        assert!(frontier.push("a".into(), &cancel).await);
        assert!(frontier.push("b".into(), &cancel).await);
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.pop().await.as_deref(), Some("a"));
        assert_eq!(frontier.pop().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn full_push_blocks_until_pop() {
        let frontier = std::sync::Arc::new(Frontier::with_capacity(1));
        let cancel = CancellationToken::new();
        assert!(frontier.push("a".into(), &cancel).await);

        let f2 = frontier.clone();
        let c2 = cancel.clone();
        let pusher = tokio::spawn(async move { f2.push("b".into(), &c2).await });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!pusher.is_finished());

        assert_eq!(frontier.pop().await.as_deref(), Some("a"));
        assert!(pusher.await.unwrap());
        assert_eq!(frontier.pop().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn cancelled_push_returns_false() {
        let frontier = Frontier::with_capacity(1);
        let cancel = CancellationToken::new();
        assert!(frontier.push("a".into(), &cancel).await);
        cancel.cancel();
        assert!(!frontier.push("b".into(), &cancel).await);
    }

    #[tokio::test]
    async fn drain_and_restore_round_trip() {
        let frontier = Frontier::with_capacity(10);
        let cancel = CancellationToken::new();
        frontier.push("a".into(), &cancel).await;
        frontier.push("b".into(), &cancel).await;

        let drained = frontier.drain().await;
        assert_eq!(drained, vec!["a".to_string(), "b".to_string()]);
        assert!(frontier.is_empty());

        frontier.restore(drained, &cancel).await;
        assert_eq!(frontier.len(), 2);
    }
}
