//! Shard descriptor
//!
//! Identifies which partition of the event stream a gateway session serves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shard ID and total shard count of a session
///
/// Serializes as the `[shard_id, shard_total]` pair used in identify payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct ShardInfo {
    shard_id: u32,
    shard_total: u32,
}

impl ShardInfo {
    /// Info used by unsharded clients
    pub const SINGLE: Self = Self {
        shard_id: 0,
        shard_total: 1,
    };

    /// Create a shard descriptor, validating the ID is within the total
    pub fn new(shard_id: u32, shard_total: u32) -> Result<Self, ShardInfoError> {
        if shard_total == 0 {
            return Err(ShardInfoError::ZeroTotal);
        }
        if shard_id >= shard_total {
            return Err(ShardInfoError::OutOfRange {
                shard_id,
                shard_total,
            });
        }
        Ok(Self {
            shard_id,
            shard_total,
        })
    }

    #[inline]
    pub const fn shard_id(&self) -> u32 {
        self.shard_id
    }

    #[inline]
    pub const fn shard_total(&self) -> u32 {
        self.shard_total
    }

    /// Rate-limit bucket this shard identifies in, given the
    /// service-reported maximum identify concurrency
    #[inline]
    pub const fn bucket(&self, max_concurrency: u32) -> u32 {
        if max_concurrency == 0 {
            0
        } else {
            self.shard_id % max_concurrency
        }
    }
}

impl Default for ShardInfo {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl fmt::Display for ShardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} / {}]", self.shard_id, self.shard_total)
    }
}

impl TryFrom<[u32; 2]> for ShardInfo {
    type Error = ShardInfoError;

    fn try_from([shard_id, shard_total]: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(shard_id, shard_total)
    }
}

impl From<ShardInfo> for [u32; 2] {
    fn from(info: ShardInfo) -> Self {
        [info.shard_id, info.shard_total]
    }
}

/// Invalid shard descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShardInfoError {
    #[error("shard total must be at least 1")]
    ZeroTotal,

    #[error("shard id {shard_id} out of range for {shard_total} shards")]
    OutOfRange { shard_id: u32, shard_total: u32 },
}
