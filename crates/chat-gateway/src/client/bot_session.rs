//! Bot session
//!
//! Owns the session controller, the event reconciliation cache and the
//! handler table. Every dispatch frame goes through [`BotSession::dispatch`],
//! which counts gateway responses, periodically evicts stale deferred events,
//! and defers payloads whose handler reports a missing entity.

use crate::events::{EventCache, GatewayEventType};
use crate::handlers::{EventHandler, HandlerOutcome, HandlerRegistry, HandlerResult};
use crate::ratelimit::GlobalRateLimit;
use crate::session::{
    ConcurrentSessionController, SessionController, SessionScheduler, SharedConnection,
};
use chat_common::ClientConfig;
use chat_core::{EntityCategory, Snowflake};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub struct BotSession {
    controller: Arc<dyn SessionController>,
    event_cache: Arc<EventCache>,
    handlers: HandlerRegistry,
    responses: AtomicU64,
}

impl BotSession {
    pub fn new(
        controller: Arc<dyn SessionController>,
        event_cache: Arc<EventCache>,
        handlers: HandlerRegistry,
    ) -> Arc<Self> {
        Arc::new(Self {
            controller,
            event_cache,
            handlers,
            responses: AtomicU64::new(0),
        })
    }

    /// Build a session from configuration
    ///
    /// A `max_concurrency` of one uses a single [`SessionScheduler`]; anything
    /// larger uses a [`ConcurrentSessionController`] with one scheduler per
    /// identify bucket.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn from_config(config: &ClientConfig, handlers: HandlerRegistry) -> Arc<Self> {
        let rate_limit = GlobalRateLimit::new();
        let delay = config.gateway.identify_delay();
        let max_concurrency = config.gateway.max_concurrency;

        let controller: Arc<dyn SessionController> = if max_concurrency > 1 {
            Arc::new(ConcurrentSessionController::new(
                rate_limit,
                delay,
                max_concurrency,
            ))
        } else {
            Arc::new(SessionScheduler::new(rate_limit, delay))
        };

        tracing::info!(
            app = %config.app.name,
            shard_total = config.gateway.shard_total,
            max_concurrency,
            identify_delay_ms = config.gateway.identify_delay_ms,
            stale_after = config.event_cache.stale_after_responses,
            handlers = handlers.len(),
            "Bot session configured"
        );

        let event_cache = Arc::new(EventCache::with_stale_after(
            config.event_cache.stale_after_responses,
        ));
        Self::new(controller, event_cache, handlers)
    }

    pub fn controller(&self) -> &Arc<dyn SessionController> {
        &self.controller
    }

    pub fn event_cache(&self) -> &Arc<EventCache> {
        &self.event_cache
    }

    pub fn global_rate_limit(&self) -> &GlobalRateLimit {
        self.controller.global_rate_limit()
    }

    /// Number of dispatch frames seen so far
    pub fn response_total(&self) -> u64 {
        self.responses.load(Ordering::Acquire)
    }

    pub fn queue_connection(&self, connection: SharedConnection) {
        self.controller.queue_connection(connection);
    }

    pub fn dequeue_connection(&self, connection: &SharedConnection) -> bool {
        self.controller.dequeue_connection(connection)
    }

    /// Stop connecting and drop every deferred event
    pub async fn shutdown(&self) {
        self.controller.shutdown().await;
        let dropped = self.event_cache.clear_all();
        tracing::info!(dropped, "Bot session shut down");
    }

    /// An entity became available; replay events waiting for it
    pub fn entity_available(&self, category: EntityCategory, id: Snowflake) -> usize {
        self.event_cache.play(category, id)
    }

    /// An entity is gone for good; drop events waiting for it
    pub fn entity_unavailable(&self, category: EntityCategory, id: Snowflake) -> usize {
        self.event_cache.clear(category, id)
    }

    /// Route one dispatch frame to its handler
    ///
    /// Unknown events and events without a handler are ignored.
    pub fn dispatch(self: &Arc<Self>, event_name: &str, payload: Value) -> HandlerResult<()> {
        let response_number = self.next_response();

        let Some(event) = GatewayEventType::parse(event_name) else {
            tracing::trace!(event = event_name, response_number, "Ignoring unknown event");
            return Ok(());
        };

        let Some(handler) = self.handlers.get(event) else {
            tracing::trace!(event = %event, response_number, "No handler registered");
            return Ok(());
        };

        self.run_handler(event, handler, payload)
    }

    fn next_response(&self) -> u64 {
        let response_number = self.responses.fetch_add(1, Ordering::AcqRel) + 1;
        self.event_cache.record_response(response_number);

        let stale_after = self.event_cache.stale_after();
        if stale_after > 0 && response_number % stale_after == 0 {
            self.event_cache.timeout(response_number);
        }
        response_number
    }

    fn run_handler(
        self: &Arc<Self>,
        event: GatewayEventType,
        handler: Arc<dyn EventHandler>,
        payload: Value,
    ) -> HandlerResult<()> {
        let HandlerOutcome::Deferred { category, id } = handler.handle(&payload)? else {
            return Ok(());
        };

        tracing::debug!(
            event = %event,
            category = %category,
            entity_id = %id,
            "Handler is waiting for an uncached entity"
        );

        let session = Arc::downgrade(self);
        self.event_cache.cache(
            category,
            id,
            payload,
            Box::new(move |payload| replay(&session, event, handler, payload)),
        );
        Ok(())
    }
}

fn replay(
    session: &Weak<BotSession>,
    event: GatewayEventType,
    handler: Arc<dyn EventHandler>,
    payload: Value,
) {
    let Some(session) = session.upgrade() else {
        tracing::trace!(event = %event, "Session dropped before replay");
        return;
    };

    if let Err(e) = session.run_handler(event, handler, payload) {
        tracing::warn!(
            event = %event,
            error = %e,
            code = e.code(),
            "Replayed event failed"
        );
    }
}

impl std::fmt::Debug for BotSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSession")
            .field("handlers", &self.handlers)
            .field("responses", &self.response_total())
            .field("deferred", &self.event_cache.count())
            .field("queued", &self.controller.queued())
            .finish_non_exhaustive()
    }
}
