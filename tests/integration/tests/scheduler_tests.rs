//! Session scheduling integration tests
//!
//! Run on a paused Tokio clock so identify delays elapse instantly.
//!
//! Run with: cargo test -p integration-tests --test scheduler_tests

use std::sync::Arc;
use std::time::Duration;

use chat_common::{ClientConfig, GatewayConfig};
use chat_core::ShardInfo;
use chat_gateway::{
    BotSession, ConnectError, GlobalRateLimit, HandlerRegistry, SessionController,
    SessionScheduler, RETRY_BACKOFF,
};
use integration_tests::{init_test_tracing, wait_until, ConnectLog, RecordingConnection};

const DELAY: Duration = Duration::from_millis(5_000);
const WAIT: Duration = Duration::from_secs(120);

fn scheduler() -> SessionScheduler {
    init_test_tracing();
    SessionScheduler::new(GlobalRateLimit::new(), DELAY)
}

// ============================================================================
// Pacing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_connects_are_spaced_in_queue_order() {
    let log = ConnectLog::new();
    let scheduler = scheduler();

    for name in ["A", "B", "C"] {
        scheduler.queue_connection(RecordingConnection::new(name, ShardInfo::SINGLE, &log).shared());
    }

    wait_until(WAIT, || log.len() == 3).await.unwrap();

    assert_eq!(log.names(), vec!["A", "B", "C"]);
    assert_eq!(log.attempts()[0].at, Duration::ZERO);
    assert!(log.gaps().iter().all(|gap| *gap >= DELAY));
    assert!(log.attempts().iter().all(|a| a.sequential));
}

#[tokio::test(start_paused = true)]
async fn test_lone_connect_is_not_sequential() {
    let log = ConnectLog::new();
    let scheduler = scheduler();

    scheduler.queue_connection(RecordingConnection::new("A", ShardInfo::SINGLE, &log).shared());
    wait_until(WAIT, || log.len() == 1).await.unwrap();

    assert!(!log.attempts()[0].sequential);
}

#[tokio::test(start_paused = true)]
async fn test_connect_after_idle_still_waits_for_spacing() {
    let log = ConnectLog::new();
    let scheduler = scheduler();

    scheduler.queue_connection(RecordingConnection::new("A", ShardInfo::SINGLE, &log).shared());
    wait_until(WAIT, || log.len() == 1 && !scheduler.is_running())
        .await
        .unwrap();

    scheduler.queue_connection(RecordingConnection::new("B", ShardInfo::SINGLE, &log).shared());
    wait_until(WAIT, || log.len() == 2).await.unwrap();

    assert!(log.gaps()[0] >= DELAY);
}

// ============================================================================
// Queue changes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_dequeued_connection_never_runs() {
    let log = ConnectLog::new();
    let scheduler = scheduler();

    let a = RecordingConnection::new("A", ShardInfo::SINGLE, &log).shared();
    let b = RecordingConnection::new("B", ShardInfo::SINGLE, &log).shared();
    let c = RecordingConnection::new("C", ShardInfo::SINGLE, &log).shared();
    scheduler.queue_connection(a);
    scheduler.queue_connection(Arc::clone(&b));
    scheduler.queue_connection(c);

    assert!(scheduler.dequeue_connection(&b));
    assert!(!scheduler.dequeue_connection(&b));

    wait_until(WAIT, || log.len() == 2 && scheduler.queued() == 0)
        .await
        .unwrap();
    tokio::time::sleep(DELAY * 2).await;

    assert_eq!(log.names(), vec!["A", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_recoverable_failure_goes_to_back_of_queue() {
    let log = ConnectLog::new();
    let scheduler = scheduler();

    scheduler.queue_connection(
        RecordingConnection::new("A", ShardInfo::SINGLE, &log)
            .then(Err(ConnectError::recoverable("handshake timed out")))
            .shared(),
    );
    scheduler.queue_connection(RecordingConnection::new("B", ShardInfo::SINGLE, &log).shared());

    wait_until(WAIT, || log.len() == 3).await.unwrap();

    assert_eq!(log.names(), vec!["A", "B", "A"]);
    let attempts = log.attempts();
    // a failed attempt is not a connect; only the retry backoff applies
    assert_eq!(attempts[1].at, RETRY_BACKOFF);
    assert!(attempts[2].at >= attempts[1].at + DELAY);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_connection_is_dropped() {
    let log = ConnectLog::new();
    let scheduler = scheduler();

    scheduler.queue_connection(
        RecordingConnection::new("A", ShardInfo::SINGLE, &log)
            .then(Err(ConnectError::Rejected))
            .shared(),
    );
    wait_until(WAIT, || log.len() == 1 && !scheduler.is_running())
        .await
        .unwrap();

    assert_eq!(scheduler.queued(), 0);
    assert!(scheduler.last_connect().is_none());
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_keeps_unfinished_connections_queued() {
    let log = ConnectLog::new();
    let scheduler = scheduler();

    scheduler.queue_connection(
        RecordingConnection::new("A", ShardInfo::SINGLE, &log)
            .taking(Duration::from_secs(30))
            .shared(),
    );
    scheduler.queue_connection(RecordingConnection::new("B", ShardInfo::SINGLE, &log).shared());
    wait_until(WAIT, || log.len() == 1).await.unwrap();

    scheduler.shutdown().await;
    assert!(scheduler.is_shutdown());
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.queued(), 2);

    scheduler.queue_connection(RecordingConnection::new("C", ShardInfo::SINGLE, &log).shared());
    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(log.names(), vec!["A"]);
}

// ============================================================================
// Sharded sessions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_bucketed_session_connects_buckets_in_parallel() {
    let config = ClientConfig {
        app: Default::default(),
        gateway: GatewayConfig {
            identify_delay_ms: 5_000,
            shard_total: 4,
            max_concurrency: 2,
        },
        event_cache: Default::default(),
    };
    let session = BotSession::from_config(&config, HandlerRegistry::new());
    let log = ConnectLog::new();

    let names = ["shard-0", "shard-1", "shard-2", "shard-3"];
    for (id, name) in (0_u32..).zip(names) {
        let shard = ShardInfo::new(id, config.gateway.shard_total).unwrap();
        session.queue_connection(RecordingConnection::new(name, shard, &log).shared());
    }

    wait_until(WAIT, || log.len() == 4).await.unwrap();
    let attempts = log.attempts();
    let at = |name: &str| attempts.iter().find(|a| a.name == name).unwrap().at;

    assert_eq!(at("shard-0"), Duration::ZERO);
    assert_eq!(at("shard-1"), Duration::ZERO);
    assert!(at("shard-2") >= DELAY);
    assert!(at("shard-3") >= DELAY);

    session.shutdown().await;
    assert_eq!(session.controller().queued(), 0);
}

#[tokio::test]
async fn test_rate_limit_is_shared_with_transport() {
    let rate_limit = GlobalRateLimit::new();
    let scheduler = SessionScheduler::new(rate_limit.clone(), DELAY);
    assert_eq!(SessionController::global_rate_limit(&scheduler).get(), None);

    // transport layer observed a global rate limit
    rate_limit.set_retry_after(Duration::from_secs(30));
    assert!(scheduler.global_rate_limit().is_limited());

    scheduler.global_rate_limit().reset();
    assert!(!rate_limit.is_limited());
}
