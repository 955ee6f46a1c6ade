//! Integration test utilities for the chat client
//!
//! Provides scripted session connections and recording event handlers for
//! end-to-end tests of the gateway core.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
