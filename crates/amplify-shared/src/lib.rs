//! # amplify-shared
//!
//! Identifier types and protocol constants shared by the store and the
//! HTTP server.

pub mod constants;
pub mod types;

pub use types::{ChannelIdentity, CreatorLookup};
