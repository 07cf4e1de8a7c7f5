//! SQLite-backed named cache stores.
//!
//! This module provides persistent request→response stores using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Multiple named stores side by side, opened by name
//! - Request keys hashed with SHA-256 over method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-store deletion for version sweeps

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::{CacheKey, compute_cache_key};
pub use stores::{CacheStore, StoredEntry};
