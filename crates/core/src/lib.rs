//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Request descriptors, cache identities and response snapshots
//! - The generation-scoped cache store contract, with in-memory and SQLite stores
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use cache::{CacheDb, CacheHandle, CacheStorage, MemoryStorage};
pub use config::{ConfigError, ShellConfig};
pub use error::Error;
pub use request::{Destination, Method, RequestDescriptor, RequestKey, RequestMode};
pub use response::{Response, ResponseType};
