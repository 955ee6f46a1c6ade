//! Entity category - the closed set of entity kinds that inbound events
//! may reference before the client has them cached

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity an event depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    User,
    Member,
    Guild,
    Channel,
    Role,
}

impl EntityCategory {
    /// Number of categories
    pub const COUNT: usize = 5;

    /// All categories, in index order
    pub const ALL: [Self; Self::COUNT] = [
        Self::User,
        Self::Member,
        Self::Guild,
        Self::Channel,
        Self::Role,
    ];

    /// Dense index for array-backed per-category storage
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::User => 0,
            Self::Member => 1,
            Self::Guild => 2,
            Self::Channel => 3,
            Self::Role => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Member => "MEMBER",
            Self::Guild => "GUILD",
            Self::Channel => "CHANNEL",
            Self::Role => "ROLE",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
