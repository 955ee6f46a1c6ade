//! Value objects - immutable types that represent domain concepts

mod shard;
mod snowflake;

pub use shard::{ShardInfo, ShardInfoError};
pub use snowflake::{Snowflake, SnowflakeParseError};
