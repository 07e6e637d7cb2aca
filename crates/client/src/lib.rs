//! Request classification and caching strategies for shellcache.
//!
//! This crate provides the network transport, the classifier that sorts
//! intercepted requests into categories, and the policy executor that serves
//! each category from the network, the cache, or both.

pub mod classify;
pub mod fetch;
pub mod policy;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classify::{Classifier, RequestCategory, Strategy};
pub use fetch::{FetchClient, FetchConfig, FetchOptions, Transport};
pub use policy::PolicyExecutor;
