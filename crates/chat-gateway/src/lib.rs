//! # chat-gateway
//!
//! Client-side gateway core: paces shard session connects under a shared
//! global rate limit, and reconciles inbound events that reference entities
//! the client has not cached yet.
//!
//! ## Example
//!
//! ```ignore
//! use chat_gateway::{BotSession, HandlerRegistry, GatewayEventType};
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.register(GatewayEventType::GuildMemberAdd, Arc::new(MemberAddHandler::new(guilds)));
//!
//! let session = BotSession::from_config(&config, handlers);
//! session.queue_connection(Arc::new(ShardConnection::new(shard)));
//!
//! // For every dispatch frame read from the socket
//! session.dispatch("GUILD_MEMBER_ADD", payload)?;
//!
//! // Once the guild arrives, deferred member events are replayed
//! session.entity_available(EntityCategory::Guild, guild_id);
//! ```

pub mod cache;
pub mod client;
pub mod events;
pub mod handlers;
pub mod ratelimit;
pub mod session;

pub use cache::SnowflakeCache;
pub use client::BotSession;
pub use events::{DeferredPayload, EventCache, GatewayEventType, ReplayCallback};
pub use handlers::{
    snowflake_field, EventHandler, HandlerError, HandlerOutcome, HandlerRegistry, HandlerResult,
};
pub use ratelimit::{GlobalRateLimit, RateLimitResponse};
pub use session::{
    ConcurrentSessionController, ConnectError, ConnectionQueue, SessionConnection,
    SessionController, SessionScheduler, SharedConnection, DEFAULT_IDENTIFY_DELAY, RETRY_BACKOFF,
};
