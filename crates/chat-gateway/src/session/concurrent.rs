//! Bucketed session controller
//!
//! Services that allow several shards to identify at once group shards into
//! `max_concurrency` buckets (`shard_id % max_concurrency`). Each bucket gets
//! its own [`SessionScheduler`]; all of them share one [`GlobalRateLimit`].

use super::connection::SharedConnection;
use super::controller::SessionController;
use super::scheduler::SessionScheduler;
use crate::ratelimit::GlobalRateLimit;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;

/// Runs one scheduler per identify bucket
pub struct ConcurrentSessionController {
    rate_limit: GlobalRateLimit,
    identify_delay: Duration,
    max_concurrency: u32,
    runtime: Handle,
    buckets: DashMap<u32, SessionScheduler>,
    shut_down: AtomicBool,
}

impl ConcurrentSessionController {
    /// Create a controller on the current Tokio runtime
    ///
    /// A `max_concurrency` of zero is treated as one.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn new(rate_limit: GlobalRateLimit, identify_delay: Duration, max_concurrency: u32) -> Self {
        Self {
            rate_limit,
            identify_delay,
            max_concurrency: max_concurrency.max(1),
            runtime: Handle::current(),
            buckets: DashMap::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn max_concurrency(&self) -> u32 {
        self.max_concurrency
    }

    /// Number of buckets that have been used so far
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Scheduler serving `bucket`, created on first use
    ///
    /// Returns `None` for a bucket that did not exist before shutdown.
    pub fn scheduler(&self, bucket: u32) -> Option<SessionScheduler> {
        if let Some(existing) = self.buckets.get(&bucket) {
            return Some(existing.clone());
        }
        if self.is_shutdown() {
            return None;
        }

        let scheduler = self
            .buckets
            .entry(bucket)
            .or_insert_with(|| {
                tracing::debug!(bucket, "Creating session scheduler for identify bucket");
                SessionScheduler::on_runtime(
                    self.runtime.clone(),
                    self.rate_limit.clone(),
                    self.identify_delay,
                )
            })
            .clone();
        Some(scheduler)
    }

    fn bucket_of(&self, connection: &SharedConnection) -> u32 {
        connection.shard_info().bucket(self.max_concurrency)
    }
}

#[async_trait]
impl SessionController for ConcurrentSessionController {
    fn queue_connection(&self, connection: SharedConnection) {
        let bucket = self.bucket_of(&connection);
        match self.scheduler(bucket) {
            Some(scheduler) => scheduler.queue_connection(connection),
            None => tracing::warn!(
                bucket,
                shard = %connection.shard_info(),
                "Connection queued after controller shutdown; dropping it"
            ),
        }
    }

    fn dequeue_connection(&self, connection: &SharedConnection) -> bool {
        let bucket = self.bucket_of(connection);
        let scheduler = self.buckets.get(&bucket).map(|s| s.clone());
        scheduler.is_some_and(|s| s.dequeue_connection(connection))
    }

    fn global_rate_limit(&self) -> &GlobalRateLimit {
        &self.rate_limit
    }

    fn queued(&self) -> usize {
        self.buckets.iter().map(|s| s.queued()).sum()
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        let schedulers: Vec<SessionScheduler> =
            self.buckets.iter().map(|s| s.value().clone()).collect();

        futures::future::join_all(schedulers.iter().map(|s| s.shutdown())).await;

        tracing::debug!(
            buckets = schedulers.len(),
            "Concurrent session controller shut down"
        );
    }
}

impl std::fmt::Debug for ConcurrentSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentSessionController")
            .field("max_concurrency", &self.max_concurrency)
            .field("buckets", &self.buckets.len())
            .field("shut_down", &self.is_shutdown())
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}
