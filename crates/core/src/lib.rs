//! Core types and shared functionality for offgrid.
//!
//! This crate provides:
//! - Named, versioned cache stores with a SQLite backend
//! - The response snapshot type shared by the store and the network layer
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod response;

pub use cache::{CacheDb, CacheKey, CacheStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use response::Snapshot;
