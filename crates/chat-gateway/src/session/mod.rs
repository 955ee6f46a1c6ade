//! Session connect scheduling
//!
//! Pending shard connects wait in a [`ConnectionQueue`] and are drained one at
//! a time by a [`SessionScheduler`], which spaces successive connects and
//! re-queues connects that fail recoverably.

mod concurrent;
mod connection;
mod controller;
mod queue;
mod scheduler;

pub use concurrent::ConcurrentSessionController;
pub use connection::{same_connection, ConnectError, SessionConnection, SharedConnection};
pub use controller::SessionController;
pub use queue::ConnectionQueue;
pub use scheduler::{SessionScheduler, DEFAULT_IDENTIFY_DELAY, RETRY_BACKOFF};
