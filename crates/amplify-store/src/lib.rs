//! # amplify-store
//!
//! Persistent storage for Amplify, backed by SQLite.
//!
//! Two collections live here: the identity store (`creators`) and the
//! append-only tip ledger (`tips`).  The crate exposes a synchronous
//! `Database` handle that wraps a `rusqlite::Connection`, runs schema
//! migrations on open, and provides typed CRUD helpers.  Every uniqueness
//! rule on creators is a schema constraint, so concurrent writers cannot
//! both win a race for the same wallet or channel id.

pub mod creators;
pub mod database;
pub mod migrations;
pub mod models;
pub mod tips;

mod error;

pub use creators::LinkOutcome;
pub use database::Database;
pub use error::{ConflictKind, Result, StoreError};
pub use models::*;
