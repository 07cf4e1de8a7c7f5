//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the versioned cache stores.

pub mod get;
pub mod stores;

pub use get::{CacheGetParams, get_impl};
pub use stores::{CacheStoresParams, stores_impl};
