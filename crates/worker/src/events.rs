//! Lifecycle events and the runtime collaborator contract.

use std::sync::Arc;

use async_trait::async_trait;
use shellcache_core::{Error, RequestDescriptor, Response};

/// An event delivered by the interception runtime.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(RequestDescriptor),
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Install => "install",
            LifecycleEvent::Activate => "activate",
            LifecycleEvent::Fetch(_) => "fetch",
        }
    }
}

/// Result of handling a lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The current generation was seeded with `cached` entries.
    Installed { cached: usize },
    /// Superseded generations were removed.
    Activated { deleted: Vec<String> },
    /// Answer the intercepted request with this response.
    Respond(Response),
    /// Let the runtime perform its default behavior.
    Passthrough,
}

/// Primitives the runtime exposes to its handlers.
///
/// Each is invoked once at the matching lifecycle point.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Activate the new worker without waiting for old clients to close.
    async fn skip_waiting(&self);

    /// Take control of all open clients immediately.
    async fn claim_clients(&self);
}

/// A registered event handler.
///
/// The runtime awaits the returned future before considering the event
/// complete, which is how install and activate defer their completion.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: LifecycleEvent, runtime: &dyn Runtime) -> Result<EventOutcome, Error>;
}

/// Registration surface offered by the runtime.
pub trait EventDispatch {
    fn register(&mut self, handler: Arc<dyn EventHandler>);
}
