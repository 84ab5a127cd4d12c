//! Dirty-set tracking.
//!
//! Producers hand changed ids to the sync scheduler through a bounded queue
//! and never wait on it. A signal that does not fit is dropped: the counter
//! itself lives in the cache, so the only cost is that the id is reconciled
//! on its next increment instead of this one.

use memecoin_core::MemeCoinId;
use std::collections::HashSet;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::debug;

/// A change notification for one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtySignal {
    /// The cached counter changed and must be reconciled.
    Marked(MemeCoinId),
    /// The cached counter was removed; any pending reconciliation is moot.
    Forgotten(MemeCoinId),
}

/// Creates a hand-off queue holding at most `capacity` signals.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn dirty_channel(capacity: usize) -> (DirtySender, DirtyReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (DirtySender { tx }, DirtyReceiver { rx })
}

/// Producer side of the hand-off queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DirtySender {
    tx: mpsc::Sender<DirtySignal>,
}

impl DirtySender {
    /// Signals that `id` changed. Returns `false` if the signal was dropped.
    pub fn mark(&self, id: MemeCoinId) -> bool {
        self.offer(DirtySignal::Marked(id))
    }

    /// Signals that `id` no longer has a counter. Returns `false` if the signal was dropped.
    pub fn forget(&self, id: MemeCoinId) -> bool {
        self.offer(DirtySignal::Forgotten(id))
    }

    fn offer(&self, signal: DirtySignal) -> bool {
        match self.tx.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(signal)) => {
                debug!(?signal, "Dirty signal queue is full, dropping signal");
                false
            }
            Err(TrySendError::Closed(signal)) => {
                debug!(?signal, "Sync scheduler has stopped, dropping signal");
                false
            }
        }
    }
}

/// Consumer side of the hand-off queue, owned by the sync scheduler.
#[derive(Debug)]
pub struct DirtyReceiver {
    rx: mpsc::Receiver<DirtySignal>,
}

impl DirtyReceiver {
    /// Waits for the next signal. Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<DirtySignal> {
        self.rx.recv().await
    }

    /// Takes a buffered signal without waiting.
    pub fn try_recv(&mut self) -> Option<DirtySignal> {
        match self.rx.try_recv() {
            Ok(signal) => Some(signal),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Ids awaiting reconciliation. Each id appears at most once.
#[derive(Debug, Default)]
pub struct PendingSet {
    ids: HashSet<MemeCoinId>,
}

impl PendingSet {
    pub fn absorb(&mut self, signal: DirtySignal) {
        match signal {
            DirtySignal::Marked(id) => {
                self.ids.insert(id);
            }
            DirtySignal::Forgotten(id) => {
                self.ids.remove(&id);
            }
        }
    }

    /// Adds `id`. Returns `false` if it was already pending.
    pub fn mark(&mut self, id: MemeCoinId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: MemeCoinId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Hands out every pending id and starts a fresh, empty set.
    pub fn take(&mut self) -> HashSet<MemeCoinId> {
        std::mem::take(&mut self.ids)
    }
}
