//! Session controller seam
//!
//! Lets the bot session hold either a single scheduler or a bucketed
//! controller behind one surface.

use super::connection::SharedConnection;
use crate::ratelimit::GlobalRateLimit;
use async_trait::async_trait;

/// Surface for queueing shard connects
#[async_trait]
pub trait SessionController: Send + Sync {
    /// Queue a connection; failures never surface here
    fn queue_connection(&self, connection: SharedConnection);

    /// Remove a still-pending connection; returns whether it was queued
    fn dequeue_connection(&self, connection: &SharedConnection) -> bool;

    /// Gate shared with the transport layer
    fn global_rate_limit(&self) -> &GlobalRateLimit;

    /// Number of connections waiting to connect
    fn queued(&self) -> usize;

    /// Stop scheduling and wait for in-flight work to wind down
    async fn shutdown(&self);
}
