//! SQLite-backed local store for cache generations and device tokens.
//!
//! This module provides a persistent store using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Named cache generations of request/response pairs
//! - Eviction by whole generation only
//! - Set-semantics storage of push delivery tokens per identity
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod tokens;

pub use crate::Error;

pub use connection::LocalDb;
pub use generations::{CacheStore, CachedResponse, RequestKey};
pub use tokens::TokenStore;
