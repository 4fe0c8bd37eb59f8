//! Core types and shared functionality for outpost.
//!
//! This crate provides:
//! - Local SQLite store for cache generations and device tokens
//! - Unified error types
//! - Layered configuration
//! - Credential candidate model for the AI key-rotation proxy

pub mod config;
pub mod credentials;
pub mod error;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use credentials::{CredentialCandidate, CredentialSources, CredentialStatus};
pub use error::Error;
pub use store::{CacheStore, CachedResponse, LocalDb, RequestKey, TokenStore};
