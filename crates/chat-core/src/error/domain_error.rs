//! Domain errors - caller-contract violations and unusable payloads

use thiserror::Error;

use crate::entities::EntityCategory;
use crate::value_objects::Snowflake;

/// Domain layer errors
///
/// None of these are retryable; they surface synchronously to the caller.
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("{category} not found: {id}")]
    EntityNotFound {
        category: EntityCategory,
        id: Snowflake,
    },

    // =========================================================================
    // Caller Contract Violations
    // =========================================================================
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    // =========================================================================
    // Payload Errors
    // =========================================================================
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Missing field in payload: {0}")]
    MissingField(&'static str),
}

impl DomainError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntityNotFound { category, .. } => match category {
                EntityCategory::User => "UNKNOWN_USER",
                EntityCategory::Member => "UNKNOWN_MEMBER",
                EntityCategory::Guild => "UNKNOWN_GUILD",
                EntityCategory::Channel => "UNKNOWN_CHANNEL",
                EntityCategory::Role => "UNKNOWN_ROLE",
            },
            Self::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::MissingField(_) => "MISSING_FIELD",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. })
    }

    /// Check if this error was caused by the payload rather than the caller
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::InvalidPayload(_) | Self::MissingField(_))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Result alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
