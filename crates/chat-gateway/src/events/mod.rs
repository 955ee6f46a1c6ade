//! Gateway events
//!
//! Dispatch event names the client processes, and the cache that holds
//! events back until the entities they reference are known.

mod cache;
mod event_types;

pub use cache::{DeferredPayload, EventCache, ReplayCallback, DEFAULT_STALE_AFTER};
pub use event_types::GatewayEventType;
