//! Tile-loaded notifications.
//!
//! Every key that becomes available in the memory tier is broadcast once.
//! Each subscriber sees every key published after it subscribed, in
//! publication order. A subscriber that falls more than
//! [`EVENT_CHANNEL_CAPACITY`] keys behind skips the oldest ones; the
//! receiver reports this as `RecvError::Lagged` and [`loaded_stream`] logs
//! and continues. Publishing never waits on subscribers.

use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::tile::TileKey;

/// Keys buffered per subscriber before the slowest one starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub(crate) struct TileEvents {
    sender: broadcast::Sender<TileKey>,
}

impl TileEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Announce that `key` is ready in memory.
    pub fn publish(&self, key: TileKey) {
        // No subscribers is not an error.
        let _ = self.sender.send(key);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TileKey> {
        self.sender.subscribe()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Adapt a receiver into a stream of loaded keys.
///
/// Lagged gaps are skipped; the stream ends when the loader is dropped.
pub fn loaded_stream(receiver: broadcast::Receiver<TileKey>) -> impl Stream<Item = TileKey> {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(key) => return Some((key, receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Tile event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{LocalProvider, ProviderRef};
    use futures::StreamExt;

    fn key(x: i32) -> TileKey {
        TileKey::new(x, 0, 3, ProviderRef::new(LocalProvider::new("test", 256)))
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_every_key() {
        let events = TileEvents::new();
        let mut first = events.subscribe();
        let mut second = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);

        events.publish(key(1));
        events.publish(key(2));

        assert_eq!(first.recv().await.unwrap(), key(1));
        assert_eq!(first.recv().await.unwrap(), key(2));
        assert_eq!(second.recv().await.unwrap(), key(1));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let events = TileEvents::new();
        events.publish(key(1));

        // Late subscribers only see later keys.
        let mut late = events.subscribe();
        events.publish(key(2));
        assert_eq!(late.recv().await.unwrap(), key(2));
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let events = TileEvents::new();
        let stream = loaded_stream(events.subscribe());

        events.publish(key(1));
        events.publish(key(2));
        drop(events);

        let keys: Vec<_> = stream.collect().await;
        assert_eq!(keys, vec![key(1), key(2)]);
    }

    #[tokio::test]
    async fn test_stream_skips_lagged_gap() {
        let events = TileEvents::new();
        let stream = loaded_stream(events.subscribe());

        for x in 0..(EVENT_CHANNEL_CAPACITY as i32 + 10) {
            events.publish(key(x));
        }
        drop(events);

        let keys: Vec<_> = stream.collect().await;
        assert_eq!(keys.len(), EVENT_CHANNEL_CAPACITY);
        assert_eq!(keys[0], key(10));
    }
}
