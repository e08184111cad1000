use std::sync::{Mutex, PoisonError};

use detour_core::StorageChange;
use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::{BoxStream, StreamExt};

/// Fans storage changes out to every live subscriber.
#[derive(Default)]
pub struct ChangeBus {
    subscribers: Mutex<Vec<UnboundedSender<StorageChange>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> BoxStream<'static, StorageChange> {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver.boxed()
    }

    /// Dropped subscribers are pruned on publish.
    pub fn publish(&self, change: StorageChange) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|subscriber| subscriber.unbounded_send(change.clone()).is_ok());
    }
}
