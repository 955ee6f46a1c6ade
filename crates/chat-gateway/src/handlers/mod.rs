//! Dispatch event handlers
//!
//! A handler either processes an event or reports which missing entity it is
//! waiting for; the bot session then defers the payload and replays it
//! through the same handler later.

mod error;

pub use error::{HandlerError, HandlerResult};

use crate::events::GatewayEventType;
use chat_core::{DomainError, DomainResult, EntityCategory, Snowflake};
use serde::Deserialize as _;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of running a handler on one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The event was applied
    Handled,
    /// The event references an entity that is not cached yet
    Deferred {
        category: EntityCategory,
        id: Snowflake,
    },
}

impl HandlerOutcome {
    pub fn deferred(category: EntityCategory, id: Snowflake) -> Self {
        Self::Deferred { category, id }
    }
}

/// Handles one kind of dispatch event
///
/// Must be re-runnable: a deferred payload is handed to the same handler again
/// once its entity is available.
pub trait EventHandler: Send + Sync {
    fn handle(&self, payload: &Value) -> HandlerResult<HandlerOutcome>;
}

/// Event type to handler table
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<GatewayEventType, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the event
    pub fn register(&mut self, event: GatewayEventType, handler: Arc<dyn EventHandler>) {
        if self.handlers.insert(event, handler).is_some() {
            tracing::debug!(event = %event, "Replaced event handler");
        }
    }

    pub fn get(&self, event: GatewayEventType) -> Option<Arc<dyn EventHandler>> {
        self.handlers.get(&event).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("events", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Read a snowflake ID field from a dispatch payload
pub fn snowflake_field(payload: &Value, field: &'static str) -> DomainResult<Snowflake> {
    let value = payload.get(field).ok_or(DomainError::MissingField(field))?;
    Ok(Snowflake::deserialize(value)?)
}
