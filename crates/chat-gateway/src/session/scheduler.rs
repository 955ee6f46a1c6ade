//! Session scheduler
//!
//! Drains a [`ConnectionQueue`] on a dedicated task, running one connect at a
//! time and keeping at least the identify delay between two successful
//! connects.

use super::connection::{ConnectError, SharedConnection};
use super::controller::SessionController;
use super::queue::ConnectionQueue;
use crate::ratelimit::GlobalRateLimit;
use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Minimum spacing between two session connects of one scheduler
pub const DEFAULT_IDENTIFY_DELAY: Duration = Duration::from_secs(5);

/// Pause after a failed or interrupted connect before the queue is touched again
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// How a drain pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassOutcome {
    /// The queue was empty when checked
    Drained,
    /// Shutdown (or the connection itself) interrupted the pass
    Cancelled,
    /// A connection was rejected and dropped
    Rejected,
}

/// Worker bookkeeping, guarded by one lock so that "queue empty, go idle"
/// and "queued, start worker" cannot interleave
#[derive(Default)]
struct WorkerSlot {
    running: bool,
    handle: Option<JoinHandle<()>>,
}

struct SchedulerInner {
    queue: ConnectionQueue,
    rate_limit: GlobalRateLimit,
    identify_delay: Duration,
    last_connect: Mutex<Option<Instant>>,
    worker: Mutex<WorkerSlot>,
    shutdown: CancellationToken,
    runtime: Handle,
}

/// Sequential connect scheduler
///
/// Cheap to clone; clones drive the same queue and worker.
#[derive(Clone)]
pub struct SessionScheduler {
    inner: Arc<SchedulerInner>,
}

impl SessionScheduler {
    /// Create a scheduler on the current Tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn new(rate_limit: GlobalRateLimit, identify_delay: Duration) -> Self {
        Self::on_runtime(Handle::current(), rate_limit, identify_delay)
    }

    /// Create a scheduler that spawns its worker on `runtime`
    pub fn on_runtime(runtime: Handle, rate_limit: GlobalRateLimit, identify_delay: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                queue: ConnectionQueue::new(),
                rate_limit,
                identify_delay,
                last_connect: Mutex::new(None),
                worker: Mutex::new(WorkerSlot::default()),
                shutdown: CancellationToken::new(),
                runtime,
            }),
        }
    }

    /// Queue a connection and make sure a worker is draining
    pub fn queue_connection(&self, connection: SharedConnection) {
        if self.inner.shutdown.is_cancelled() {
            tracing::warn!(
                shard = %connection.shard_info(),
                "Connection queued after scheduler shutdown; it will not be run"
            );
        }

        self.inner.queue.push(connection);
        self.run_worker();
    }

    /// Remove a pending connection; no-op if it already ran or is running
    pub fn dequeue_connection(&self, connection: &SharedConnection) -> bool {
        let removed = self.inner.queue.remove(connection);
        if removed {
            tracing::debug!(shard = %connection.shard_info(), "Connection removed from queue");
        }
        removed
    }

    /// Cancel the in-flight pass and wait for the worker task to exit
    ///
    /// A connection interrupted mid-run is put back in the queue.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let handle = self.inner.worker.lock().handle.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Session scheduler worker failed");
            }
        }

        tracing::debug!(queued = self.inner.queue.len(), "Session scheduler shut down");
    }

    pub fn global_rate_limit(&self) -> &GlobalRateLimit {
        &self.inner.rate_limit
    }

    pub fn identify_delay(&self) -> Duration {
        self.inner.identify_delay
    }

    /// Number of connections waiting to connect
    pub fn queued(&self) -> usize {
        self.inner.queue.len()
    }

    /// Whether a worker is currently draining the queue
    pub fn is_running(&self) -> bool {
        self.inner.worker.lock().running
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// When the last successful connect finished
    pub fn last_connect(&self) -> Option<Instant> {
        *self.inner.last_connect.lock()
    }

    fn run_worker(&self) {
        let mut slot = self.inner.worker.lock();
        if slot.running || self.inner.shutdown.is_cancelled() {
            return;
        }

        slot.running = true;
        let inner = Arc::clone(&self.inner);
        slot.handle = Some(self.inner.runtime.spawn(inner.drive()));
    }
}

impl SchedulerInner {
    /// Worker task body: run passes until the queue stays empty
    async fn drive(self: Arc<Self>) {
        loop {
            let outcome = self.process_queue().await;

            let idle = {
                let mut slot = self.worker.lock();
                let idle = self.shutdown.is_cancelled() || self.queue.is_empty();
                if idle {
                    slot.running = false;
                }
                idle
            };

            if idle {
                tracing::debug!(?outcome, queued = self.queue.len(), "Session scheduler idle");
                return;
            }

            tracing::debug!(
                ?outcome,
                queued = self.queue.len(),
                "Queue refilled during pass; starting another"
            );
        }
    }

    /// One drain pass
    async fn process_queue(&self) -> PassOutcome {
        if let Some(wait) = self.remaining_identify_delay() {
            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                "Waiting for identify delay before next connect"
            );
            if !self.sleep(wait).await {
                return PassOutcome::Cancelled;
            }
        }

        let mut sequential = self.queue.len() > 1;

        while let Some(connection) = self.queue.pop() {
            let shard = connection.shard_info();
            tracing::debug!(
                shard_id = shard.shard_id(),
                shard_total = shard.shard_total(),
                reconnect = connection.is_reconnect(),
                sequential,
                "Running session connect"
            );

            let result = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => Err(ConnectError::Cancelled),
                result = AssertUnwindSafe(connection.run(sequential)).catch_unwind() => {
                    result.unwrap_or_else(|panic| {
                        Err(ConnectError::recoverable(format!(
                            "connect panicked: {}",
                            panic_message(panic.as_ref())
                        )))
                    })
                }
            };

            match result {
                Ok(()) => {
                    sequential = true;
                    *self.last_connect.lock() = Some(Instant::now());

                    if self.queue.is_empty() {
                        break;
                    }
                    if !self.sleep(self.identify_delay).await {
                        return PassOutcome::Cancelled;
                    }
                }
                Err(ConnectError::Recoverable(reason)) => {
                    tracing::warn!(
                        shard_id = shard.shard_id(),
                        shard_total = shard.shard_total(),
                        reason = %reason,
                        "Session connect failed; re-queueing"
                    );
                    self.queue.push(connection);
                    if !self.sleep(RETRY_BACKOFF).await {
                        return PassOutcome::Cancelled;
                    }
                }
                Err(ConnectError::Cancelled) => {
                    tracing::info!(
                        shard_id = shard.shard_id(),
                        shard_total = shard.shard_total(),
                        "Session connect interrupted; re-queueing"
                    );
                    self.queue.push(connection);
                    if !self.shutdown.is_cancelled() {
                        self.sleep(RETRY_BACKOFF).await;
                    }
                    return PassOutcome::Cancelled;
                }
                Err(ConnectError::Rejected) => {
                    // TODO: surface dropped connects to the caller once shutdown semantics are settled
                    tracing::warn!(
                        shard_id = shard.shard_id(),
                        shard_total = shard.shard_total(),
                        "Session connect rejected; dropping connection"
                    );
                    return PassOutcome::Rejected;
                }
            }
        }

        PassOutcome::Drained
    }

    fn remaining_identify_delay(&self) -> Option<Duration> {
        let last = (*self.last_connect.lock())?;
        self.identify_delay
            .checked_sub(last.elapsed())
            .filter(|left| !left.is_zero())
    }

    /// Sleep unless shutdown fires first; returns false when cancelled
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[async_trait]
impl SessionController for SessionScheduler {
    fn queue_connection(&self, connection: SharedConnection) {
        SessionScheduler::queue_connection(self, connection);
    }

    fn dequeue_connection(&self, connection: &SharedConnection) -> bool {
        SessionScheduler::dequeue_connection(self, connection)
    }

    fn global_rate_limit(&self) -> &GlobalRateLimit {
        SessionScheduler::global_rate_limit(self)
    }

    fn queued(&self) -> usize {
        SessionScheduler::queued(self)
    }

    async fn shutdown(&self) {
        SessionScheduler::shutdown(self).await;
    }
}

impl std::fmt::Debug for SessionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionScheduler")
            .field("queued", &self.queued())
            .field("running", &self.is_running())
            .field("identify_delay", &self.inner.identify_delay)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
