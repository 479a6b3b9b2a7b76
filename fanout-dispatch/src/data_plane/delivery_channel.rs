//! Bounded delivery conduits handed out to subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::Mutex;

/// Buffer depth of every delivery channel. A subscriber that briefly lags
/// keeps up to this many messages before deliveries start dropping.
pub const DELIVERY_BUFFER: usize = 10;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to one bounded subscriber conduit.
///
/// Clones share the same underlying queue: sends from any clone feed the one
/// buffer, and receives from any clone compete for messages, each message
/// reaching exactly one receiver. Handle identity (not queue content) is what
/// [`unsubscribe`](crate::Dispatcher::unsubscribe) matches against a route's
/// subscriber list.
pub struct DeliveryChannel<T> {
    id: u64,
    tx: mpsc::Sender<T>,
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for DeliveryChannel<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> DeliveryChannel<T> {
    pub(crate) fn new(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer);
        Self {
            id: NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed),
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Process-unique identity of this channel and all its clones.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receives the next delivered message, waiting until one arrives.
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Non-blocking receive.
    pub async fn try_recv(&self) -> Result<T, TryRecvError> {
        self.rx.lock().await.try_recv()
    }

    /// Non-blocking delivery attempt used by the fan-out workers.
    pub(crate) fn try_send(&self, message: T) -> Result<(), TrySendError<T>> {
        self.tx.try_send(message)
    }

    /// Best-effort drain of buffered messages. Returns the number discarded,
    /// or `None` when a concurrent reader holds the receiver.
    pub(crate) fn drain_pending(&self) -> Option<usize> {
        let mut rx = self.rx.try_lock().ok()?;
        let mut discarded = 0;
        while rx.try_recv().is_ok() {
            discarded += 1;
        }
        Some(discarded)
    }

    pub(crate) fn same_channel(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryChannel, DELIVERY_BUFFER};

    #[tokio::test]
    async fn fresh_channels_have_distinct_identities() {
        let first = DeliveryChannel::<u32>::new(DELIVERY_BUFFER);
        let second = DeliveryChannel::<u32>::new(DELIVERY_BUFFER);

        assert_ne!(first.id(), second.id());
        assert!(first.same_channel(&first.clone()));
        assert!(!first.same_channel(&second));
    }

    #[tokio::test]
    async fn clones_compete_for_messages() {
        let channel = DeliveryChannel::<u32>::new(DELIVERY_BUFFER);
        let twin = channel.clone();

        channel.try_send(7).expect("buffer should accept message");

        assert_eq!(twin.recv().await, Some(7));
        assert!(channel.try_recv().await.is_err());
    }

    #[tokio::test]
    async fn try_send_reports_full_buffer() {
        let channel = DeliveryChannel::<u32>::new(2);

        channel.try_send(1).expect("first message should fit");
        channel.try_send(2).expect("second message should fit");

        assert!(channel.try_send(3).is_err());
    }

    #[tokio::test]
    async fn drain_pending_discards_buffered_messages() {
        let channel = DeliveryChannel::<u32>::new(DELIVERY_BUFFER);
        channel.try_send(1).expect("buffer should accept message");
        channel.try_send(2).expect("buffer should accept message");

        assert_eq!(channel.drain_pending(), Some(2));
        assert!(channel.try_recv().await.is_err());
    }
}
