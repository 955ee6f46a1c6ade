//! Session connection contract
//!
//! Implemented by the transport layer; the scheduler only decides when to
//! call [`SessionConnection::run`].

use async_trait::async_trait;
use chat_core::ShardInfo;
use std::sync::Arc;
use thiserror::Error;

/// One shard's pending session attempt
#[async_trait]
pub trait SessionConnection: Send + Sync {
    /// Perform the handshake and resolve once the attempt has concluded
    ///
    /// `sequential` tells the connection it is one of several shards
    /// identifying back to back.
    async fn run(&self, sequential: bool) -> Result<(), ConnectError>;

    /// Shard this session serves
    fn shard_info(&self) -> ShardInfo;

    /// Whether this attempt resumes after a dropped session
    fn is_reconnect(&self) -> bool {
        false
    }
}

/// Shared handle to a queued connection; identity is the allocation
pub type SharedConnection = Arc<dyn SessionConnection>;

/// Whether two handles refer to the same connection
pub fn same_connection(a: &SharedConnection, b: &SharedConnection) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Ways a connect attempt can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Transient failure; the connection is queued again
    #[error("recoverable connect failure: {0}")]
    Recoverable(String),

    /// The attempt was interrupted by shutdown; the connection is queued again
    #[error("connect cancelled")]
    Cancelled,

    /// The execution context is gone; the connection is dropped
    #[error("connect rejected: execution context unavailable")]
    Rejected,
}

impl ConnectError {
    /// Create a recoverable error
    pub fn recoverable(reason: impl Into<String>) -> Self {
        Self::Recoverable(reason.into())
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }

    /// Whether the scheduler keeps the connection after this failure
    pub fn requeues(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}
