//! Named cache storage.
//!
//! A storage holds any number of named stores, each an ordered collection of
//! request key to response entries. Two backends are provided:
//!
//! - [`MemoryStorage`]: process-local, used by tests and ephemeral hosts
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, versioned migrations
//!
//! Only `GET` requests are stored or matched. Putting an entry replaces any
//! previous entry with the same key; entries are never edited in place.

pub mod connection;
pub mod entries;
pub mod memory;
pub mod migrations;
pub mod names;

use crate::{Error, Request, Response};

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use names::{StoreNames, version_tag};

/// Options for a lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Compare URLs without their query strings.
    pub ignore_search: bool,
}

impl MatchOptions {
    pub const EXACT: Self = Self { ignore_search: false };
    pub const IGNORE_SEARCH: Self = Self { ignore_search: true };
}

/// Persistent key-value store API the gatekeeper is written against.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync + 'static {
    /// Create the named store if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// All store names, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and all its entries. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look up a request in one store. A missing store is a miss.
    ///
    /// With `ignore_search`, the most recently stored entry whose URL
    /// differs only in its query string is returned.
    async fn match_in(&self, name: &str, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error>;

    /// Store a response, creating the store if needed.
    async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), Error>;

    /// Request URLs stored in the named store, oldest first.
    async fn entries(&self, name: &str) -> Result<Vec<String>, Error>;

    /// Look up a request in every store, in creation order.
    async fn match_any(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        for name in self.keys().await? {
            if let Some(response) = self.match_in(&name, request, options).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

pub(crate) fn require_get(request: &Request) -> Result<(), Error> {
    if request.is_get() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("cannot store a {} request", request.method)))
    }
}
