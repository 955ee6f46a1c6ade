//! # chat-core
//!
//! Value objects shared by every layer of the client: entity IDs, shard
//! descriptors, the closed set of entity categories, and domain errors.
//! This crate has no dependencies on the runtime or transport.

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::EntityCategory;
pub use error::{DomainError, DomainResult};
pub use value_objects::{ShardInfo, ShardInfoError, Snowflake, SnowflakeParseError};
