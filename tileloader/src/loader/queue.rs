//! Bounded work queue with drop-oldest backpressure.
//!
//! Producers never wait: when the queue is full the oldest pending key is
//! displaced to make room. Consumers park on a [`Notify`] until a key is
//! available.

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use tokio::sync::Notify;

use crate::tile::TileKey;

/// What happened to a key handed to [`WorkQueue::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PushOutcome {
    /// Key appended
    Queued,
    /// Key was already pending, nothing changed
    AlreadyQueued,
    /// Key appended after the oldest pending key was dropped
    Displaced(TileKey),
}

struct Pending {
    order: VecDeque<TileKey>,
    members: HashSet<TileKey>,
}

pub(crate) struct WorkQueue {
    capacity: usize,
    pending: Mutex<Pending>,
    available: Notify,
}

impl WorkQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pending: Mutex::new(Pending {
                order: VecDeque::with_capacity(capacity),
                members: HashSet::with_capacity(capacity),
            }),
            available: Notify::new(),
        }
    }

    /// Append `key` without blocking.
    pub fn push(&self, key: TileKey) -> PushOutcome {
        let outcome = {
            let mut pending = self.pending.lock();
            if pending.members.contains(&key) {
                return PushOutcome::AlreadyQueued;
            }

            let mut displaced = None;
            if pending.order.len() >= self.capacity {
                if let Some(oldest) = pending.order.pop_front() {
                    pending.members.remove(&oldest);
                    displaced = Some(oldest);
                }
            }

            pending.members.insert(key.clone());
            pending.order.push_back(key);
            displaced.map_or(PushOutcome::Queued, PushOutcome::Displaced)
        };

        self.available.notify_one();
        outcome
    }

    /// Remove the oldest pending key, if any.
    pub fn try_pop(&self) -> Option<TileKey> {
        let mut pending = self.pending.lock();
        let key = pending.order.pop_front()?;
        pending.members.remove(&key);
        Some(key)
    }

    /// Wait for the next key.
    ///
    /// Every consumer drains the queue before parking and every push leaves a
    /// wake-up permit, so no key is stranded while a consumer sleeps.
    pub async fn pop(&self) -> TileKey {
        loop {
            if let Some(key) = self.try_pop() {
                return key;
            }
            self.available.notified().await;
        }
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.pending.lock().members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().order.len()
    }

    /// Pending keys, oldest first.
    pub fn snapshot(&self) -> Vec<TileKey> {
        self.pending.lock().order.iter().cloned().collect()
    }

    /// Drop every pending key, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut pending = self.pending.lock();
        let count = pending.order.len();
        pending.order.clear();
        pending.members.clear();
        count
    }
}
