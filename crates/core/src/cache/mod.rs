//! Generation-scoped response cache.
//!
//! A cache store holds any number of named generations; each generation maps
//! request identities to response snapshots. Two stores are provided:
//!
//! - [`MemoryStorage`]: process-local, backed by `tokio::sync::RwLock`
//! - [`CacheDb`]: SQLite via tokio-rusqlite, with schema migrations and WAL mode
//!
//! The interception layer only talks to the [`CacheStorage`] and
//! [`CacheHandle`] traits.

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use async_trait::async_trait;

pub use crate::Error;
use crate::{RequestKey, Response};

pub use connection::CacheDb;
pub use memory::{MemoryGeneration, MemoryStorage};
pub use sqlite::SqliteGeneration;

/// A store of named cache generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    type Handle: CacheHandle;

    /// Open the generation called `name`, creating it if it does not exist.
    async fn open(&self, name: &str) -> Result<Self::Handle, Error>;

    /// Whether a generation called `name` exists.
    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Names of all generations, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and every entry in it.
    ///
    /// Returns false if no such generation existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;
}

/// Access to a single opened generation.
#[async_trait]
pub trait CacheHandle: Send + Sync {
    /// Name of the generation this handle points at.
    fn name(&self) -> &str;

    /// Look up the response stored under `key`.
    async fn match_request(&self, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store `response` under `key`, replacing any previous entry.
    ///
    /// Fails with a cache error once the generation has been deleted.
    async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// Store several entries. Stores that can do so write them atomically.
    async fn put_all(&self, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        for (key, response) in entries {
            self.put(key, response).await?;
        }
        Ok(())
    }

    /// Remove the entry stored under `key`.
    async fn delete(&self, key: &RequestKey) -> Result<bool, Error>;

    /// Identities of all stored entries, in insertion order.
    async fn keys(&self) -> Result<Vec<RequestKey>, Error>;
}
