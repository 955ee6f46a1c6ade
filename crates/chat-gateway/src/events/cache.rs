//! Event reconciliation cache
//!
//! Holds dispatch payloads that reference an entity the client has not cached
//! yet, keyed by (category, id), and replays them in arrival order once the
//! entity shows up.

use chat_core::{EntityCategory, Snowflake};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// Deferred payloads older than this many gateway responses are discarded
pub const DEFAULT_STALE_AFTER: u64 = 100;

/// Re-runs the original handler against the deferred payload
pub type ReplayCallback = Box<dyn FnOnce(Value) + Send + 'static>;

/// A payload waiting for its prerequisite entity
pub struct DeferredPayload {
    payload: Value,
    response_number: u64,
    callback: ReplayCallback,
}

impl DeferredPayload {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Gateway response number current when the payload was deferred
    pub fn response_number(&self) -> u64 {
        self.response_number
    }

    fn replay(self) {
        (self.callback)(self.payload);
    }
}

impl std::fmt::Debug for DeferredPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredPayload")
            .field("payload", &self.payload)
            .field("response_number", &self.response_number)
            .finish_non_exhaustive()
    }
}

type PendingById = HashMap<Snowflake, VecDeque<DeferredPayload>>;

/// Two-level map (category -> id -> FIFO of deferred payloads)
///
/// Every operation takes the same lock. Callbacks run after the lock is
/// released, so a replayed handler may defer again.
pub struct EventCache {
    pending: Mutex<[PendingById; EntityCategory::COUNT]>,
    current_response: AtomicU64,
    stale_after: u64,
}

impl EventCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_stale_after(DEFAULT_STALE_AFTER)
    }

    /// Create a cache that evicts entries older than `stale_after` responses
    #[must_use]
    pub fn with_stale_after(stale_after: u64) -> Self {
        Self {
            pending: Mutex::new(std::array::from_fn(|_| HashMap::new())),
            current_response: AtomicU64::new(0),
            stale_after,
        }
    }

    pub fn stale_after(&self) -> u64 {
        self.stale_after
    }

    /// Record the sequence number of the latest gateway response; used to
    /// stamp payloads deferred afterwards
    pub fn record_response(&self, response_number: u64) {
        self.current_response
            .fetch_max(response_number, Ordering::AcqRel);
    }

    /// Defer `payload` until `(category, id)` becomes available
    pub fn cache(
        &self,
        category: EntityCategory,
        id: Snowflake,
        payload: Value,
        callback: ReplayCallback,
    ) {
        let entry = DeferredPayload {
            payload,
            response_number: self.current_response.load(Ordering::Acquire),
            callback,
        };

        let queued = {
            let mut pending = self.pending.lock();
            let queue = pending[category.index()].entry(id).or_default();
            queue.push_back(entry);
            queue.len()
        };

        tracing::debug!(
            category = %category,
            entity_id = %id,
            queued,
            "Deferred event until entity is available"
        );
    }

    /// Replay every payload deferred for `(category, id)`, oldest first
    ///
    /// Returns how many were replayed; an unknown key is a no-op.
    pub fn play(&self, category: EntityCategory, id: Snowflake) -> usize {
        let Some(queue) = self.take(category, id) else {
            return 0;
        };

        let count = queue.len();
        tracing::debug!(
            category = %category,
            entity_id = %id,
            count,
            "Replaying deferred events"
        );

        for entry in queue {
            entry.replay();
        }
        count
    }

    /// Discard everything deferred for `(category, id)` without replaying
    pub fn clear(&self, category: EntityCategory, id: Snowflake) -> usize {
        let count = self.take(category, id).map_or(0, |queue| queue.len());
        if count > 0 {
            tracing::debug!(
                category = %category,
                entity_id = %id,
                count,
                "Discarded deferred events"
            );
        }
        count
    }

    /// Discard every deferred payload
    pub fn clear_all(&self) -> usize {
        let drained: Vec<PendingById> = {
            let mut pending = self.pending.lock();
            pending.iter_mut().map(std::mem::take).collect()
        };

        let count = drained.iter().map(count_entries).sum();
        if count > 0 {
            tracing::debug!(count, "Discarded all deferred events");
        }
        count
    }

    /// Evict payloads deferred more than `stale_after` responses before
    /// `response_number`
    pub fn timeout(&self, response_number: u64) -> usize {
        self.record_response(response_number);
        let threshold = response_number.saturating_sub(self.stale_after);

        // evicted entries are dropped after the lock is released
        let mut evicted = Vec::new();
        {
            let mut pending = self.pending.lock();
            for by_id in pending.iter_mut() {
                by_id.retain(|_, queue| {
                    while queue
                        .front()
                        .is_some_and(|entry| entry.response_number < threshold)
                    {
                        evicted.extend(queue.pop_front());
                    }
                    !queue.is_empty()
                });
            }
        }

        let count = evicted.len();
        if count > 0 {
            tracing::warn!(
                count,
                response_number,
                stale_after = self.stale_after,
                "Evicted stale deferred events"
            );
        }
        count
    }

    /// Total number of deferred payloads
    pub fn count(&self) -> usize {
        self.pending.lock().iter().map(count_entries).sum()
    }

    /// Number of payloads deferred for one key
    pub fn count_for(&self, category: EntityCategory, id: Snowflake) -> usize {
        self.pending.lock()[category.index()]
            .get(&id)
            .map_or(0, VecDeque::len)
    }

    /// Whether anything is deferred for one key
    pub fn contains(&self, category: EntityCategory, id: Snowflake) -> bool {
        self.pending.lock()[category.index()].contains_key(&id)
    }

    fn take(
        &self,
        category: EntityCategory,
        id: Snowflake,
    ) -> Option<VecDeque<DeferredPayload>> {
        self.pending.lock()[category.index()].remove(&id)
    }
}

fn count_entries(by_id: &PendingById) -> usize {
    by_id.values().map(VecDeque::len).sum()
}

impl Default for EventCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCache")
            .field("count", &self.count())
            .field("stale_after", &self.stale_after)
            .finish()
    }
}
