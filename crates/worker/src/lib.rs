//! Offline-caching gatekeeper.
//!
//! Intercepts a page's requests and answers them from named cache stores,
//! from the network, or both. The host drives three hooks:
//!
//! - [`Gatekeeper::install`]: precache the skeleton
//! - [`Gatekeeper::activate`]: delete other versions' stores, take control
//! - [`Gatekeeper::fetch`]: route one request to a strategy
//!
//! Storage and network are injected, so the policy runs the same over
//! [`gatekeeper_core::MemoryStorage`] in tests and
//! [`gatekeeper_core::CacheDb`] in production.

pub mod gatekeeper;
pub mod lifecycle;
pub mod routing;

#[cfg(test)]
mod test_support;

pub use gatekeeper::{FetchOutcome, Gatekeeper, ResponseSource, Served};
pub use lifecycle::{ActivateOutcome, InstallOutcome, WorkerState};
pub use routing::{Route, Router};
