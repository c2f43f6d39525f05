//! Core types and shared functionality for the offline gatekeeper.
//!
//! This crate provides:
//! - Request/response model and cache keys
//! - Named cache storage (in-memory and SQLite backends)
//! - The network collaborator trait
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod network;
pub mod request;
pub mod storage;

pub use config::{AppConfig, ConfigError, Strategy};
pub use error::Error;
pub use network::Network;
pub use request::{Request, RequestKey, RequestMode, Response};
pub use storage::{CacheDb, CacheStorage, MatchOptions, MemoryStorage, StoreNames};
