//! Test fixtures and data generators
//!
//! Dispatch payloads and recording handlers for reconciliation tests.

use std::sync::Arc;

use chat_gateway::{
    snowflake_field, EventHandler, GatewayEventType, HandlerError, HandlerOutcome, HandlerResult,
    SnowflakeCache,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Minimal cached guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub name: String,
}

impl Guild {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

pub fn guild_name(guild: &Guild) -> &str {
    &guild.name
}

/// `GUILD_MEMBER_ADD` payload
pub fn member_add(guild_id: u64, user: &str) -> Value {
    json!({
        "guild_id": guild_id.to_string(),
        "user": { "username": user },
    })
}

/// `MESSAGE_CREATE` payload
pub fn message_create(channel_id: u64, content: &str) -> Value {
    json!({
        "channel_id": channel_id.to_string(),
        "content": content,
    })
}

/// Handler that needs its event's prerequisite entity cached before it
/// records the payload
pub struct RecordingHandler<T> {
    event: GatewayEventType,
    entities: Arc<SnowflakeCache<T>>,
    handled: Mutex<Vec<Value>>,
}

impl<T> RecordingHandler<T> {
    pub fn new(event: GatewayEventType, entities: &Arc<SnowflakeCache<T>>) -> Arc<Self> {
        Arc::new(Self {
            event,
            entities: Arc::clone(entities),
            handled: Mutex::new(Vec::new()),
        })
    }

    pub fn handled(&self) -> Vec<Value> {
        self.handled.lock().clone()
    }
}

impl<T: Send + Sync> EventHandler for RecordingHandler<T> {
    fn handle(&self, payload: &Value) -> HandlerResult<HandlerOutcome> {
        let Some((category, field)) = self.event.prerequisite() else {
            return Err(HandlerError::Internal(format!(
                "{} has no prerequisite entity",
                self.event
            )));
        };

        let id = snowflake_field(payload, field)?;
        if !self.entities.contains(id) {
            return Ok(HandlerOutcome::deferred(category, id));
        }

        self.handled.lock().push(payload.clone());
        Ok(HandlerOutcome::Handled)
    }
}
