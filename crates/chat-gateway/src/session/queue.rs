//! Pending connection queue

use super::connection::{same_connection, SharedConnection};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// FIFO of connections waiting for their turn to connect
///
/// Safe to mutate from any thread while a scheduler drains it.
#[derive(Default)]
pub struct ConnectionQueue {
    pending: Mutex<VecDeque<SharedConnection>>,
}

impl ConnectionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connection at the tail
    pub fn push(&self, connection: SharedConnection) {
        self.pending.lock().push_back(connection);
    }

    /// Take the connection at the head
    pub fn pop(&self) -> Option<SharedConnection> {
        self.pending.lock().pop_front()
    }

    /// Remove the first entry that is `connection`; returns whether one was found
    pub fn remove(&self, connection: &SharedConnection) -> bool {
        let mut pending = self.pending.lock();
        match pending.iter().position(|c| same_connection(c, connection)) {
            Some(index) => {
                pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, connection: &SharedConnection) -> bool {
        self.pending
            .lock()
            .iter()
            .any(|c| same_connection(c, connection))
    }

    /// Take every queued connection, in order
    pub fn drain(&self) -> Vec<SharedConnection> {
        self.pending.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl std::fmt::Debug for ConnectionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionQueue")
            .field("pending", &self.len())
            .finish()
    }
}
