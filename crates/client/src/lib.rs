//! Request routing for offgrid.
//!
//! This crate classifies intercepted requests, applies a caching strategy
//! per route class, and manages the install/activate lifecycle of the
//! versioned cache store.

pub mod classify;
pub mod fetch;
pub mod lifecycle;
pub mod placeholder;
pub mod request;
pub mod router;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use classify::{Classifier, RouteClass};
pub use fetch::{FetchClient, FetchConfig, Transport};
pub use lifecycle::{ActivateReport, InstallReport, Lifecycle, LifecycleState};
pub use request::{InterceptedRequest, RequestMode};
pub use reqwest::Method;
pub use router::Router;
pub use strategy::{Outcome, Strategy};
