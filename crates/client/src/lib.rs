//! Client code for the offline gatekeeper.
//!
//! This crate provides the reqwest-backed network and URL resolution shared
//! by the server host.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, resolve};
