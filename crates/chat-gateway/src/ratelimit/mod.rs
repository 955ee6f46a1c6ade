//! Global rate limit shared by every shard of the process

mod global;

pub use global::{GlobalRateLimit, RateLimitResponse};
