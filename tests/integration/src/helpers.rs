//! Test helpers for integration tests
//!
//! Provides fake session connections that record when they were run and
//! replay a scripted sequence of outcomes.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chat_common::{try_init_tracing_with_config, TracingConfig};
use chat_core::ShardInfo;
use chat_gateway::{ConnectError, SessionConnection, SharedConnection};
use parking_lot::Mutex;
use tokio::time::Instant;

/// One recorded connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectAttempt {
    pub name: &'static str,
    /// Time since the log was created
    pub at: Duration,
    pub sequential: bool,
}

/// Ordered record of connect attempts across connections
#[derive(Debug)]
pub struct ConnectLog {
    started: Instant,
    attempts: Mutex<Vec<ConnectAttempt>>,
}

impl ConnectLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            attempts: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, name: &'static str, sequential: bool) {
        self.attempts.lock().push(ConnectAttempt {
            name,
            at: self.started.elapsed(),
            sequential,
        });
    }

    pub fn attempts(&self) -> Vec<ConnectAttempt> {
        self.attempts.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.attempts.lock().iter().map(|a| a.name).collect()
    }

    pub fn len(&self) -> usize {
        self.attempts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.lock().is_empty()
    }

    /// Gaps between consecutive attempts
    pub fn gaps(&self) -> Vec<Duration> {
        let attempts = self.attempts.lock();
        attempts.windows(2).map(|w| w[1].at - w[0].at).collect()
    }
}

/// Session connection driven by a script of outcomes
///
/// Once the script runs out every further run succeeds.
pub struct RecordingConnection {
    name: &'static str,
    shard: ShardInfo,
    log: Arc<ConnectLog>,
    script: Mutex<VecDeque<Result<(), ConnectError>>>,
    run_time: Duration,
}

impl RecordingConnection {
    pub fn new(name: &'static str, shard: ShardInfo, log: &Arc<ConnectLog>) -> Self {
        Self {
            name,
            shard,
            log: Arc::clone(log),
            script: Mutex::new(VecDeque::new()),
            run_time: Duration::ZERO,
        }
    }

    /// Queue an outcome for the next unscripted run
    pub fn then(self, outcome: Result<(), ConnectError>) -> Self {
        self.script.lock().push_back(outcome);
        self
    }

    /// Simulate a handshake that takes `run_time`
    pub fn taking(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }

    pub fn shared(self) -> SharedConnection {
        Arc::new(self)
    }
}

#[async_trait]
impl SessionConnection for RecordingConnection {
    async fn run(&self, sequential: bool) -> Result<(), ConnectError> {
        self.log.record(self.name, sequential);
        if !self.run_time.is_zero() {
            tokio::time::sleep(self.run_time).await;
        }
        self.script.lock().pop_front().unwrap_or(Ok(()))
    }

    fn shard_info(&self) -> ShardInfo {
        self.shard
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while !condition() {
        if Instant::now() >= deadline {
            bail!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Install a development subscriber once per test binary
pub fn init_test_tracing() {
    // a second call in the same binary reports AlreadyInitialized
    let _ = try_init_tracing_with_config(TracingConfig::development());
}
