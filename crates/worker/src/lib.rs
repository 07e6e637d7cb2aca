//! Lifecycle binding for shellcache.
//!
//! Wires the install, activate and fetch events of an interception runtime
//! to the caching layer:
//!
//! - install seeds the current generation from the precache list
//! - activate deletes every other generation
//! - fetch classifies the request and applies its caching strategy

pub mod dispatch;
pub mod events;
pub mod generations;
pub mod logging;
pub mod precache;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use dispatch::{LocalDispatcher, WorkerState};
pub use events::{EventDispatch, EventHandler, EventOutcome, LifecycleEvent, Runtime};
pub use worker::ServiceWorker;
