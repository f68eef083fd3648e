//! SQLite-backed cache for search results.
//!
//! This module provides a persistent TTL cache using SQLite with async
//! access via tokio-rusqlite. It supports:
//!
//! - SHA-256 keys over `(query, model)`
//! - Lazy expiry on read
//! - Automatic schema migrations

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod search;

pub use crate::Error;

pub use connection::SearchCache;
pub use hash::cache_key;
