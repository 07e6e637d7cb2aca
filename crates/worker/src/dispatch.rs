//! In-process event dispatcher enforcing lifecycle ordering.
//!
//! Install must complete before activate is accepted, and fetch events are
//! passed through until activation has completed, so interception never
//! runs against a generation that has not been seeded and swept.

use std::sync::Arc;

use shellcache_core::Error;
use tokio::sync::RwLock;

use crate::events::{EventDispatch, EventHandler, EventOutcome, LifecycleEvent, Runtime};

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    /// Install handlers are running.
    Installing,
    Installed,
    /// Activate handlers are running.
    Activating,
    Activated,
    /// Install failed; the worker never becomes active.
    Redundant,
}

/// Dispatches events to registered handlers in registration order.
pub struct LocalDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
    runtime: Arc<dyn Runtime>,
    state: RwLock<WorkerState>,
}

impl LocalDispatcher {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { handlers: Vec::new(), runtime, state: RwLock::new(WorkerState::Parsed) }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Deliver `event` and wait for every handler it reaches.
    ///
    /// Install and activate run every handler; fetch stops at the first
    /// handler that responds.
    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<EventOutcome, Error> {
        let state = self.state().await;
        tracing::debug!(event = event.name(), ?state, "dispatching");

        match event {
            LifecycleEvent::Install => {
                self.transition(WorkerState::Parsed, WorkerState::Installing, "install").await?;
                match self.run_all(LifecycleEvent::Install).await {
                    Ok(outcome) => {
                        *self.state.write().await = WorkerState::Installed;
                        Ok(outcome)
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "install failed");
                        *self.state.write().await = WorkerState::Redundant;
                        Err(err)
                    }
                }
            }
            LifecycleEvent::Activate => {
                self.transition(WorkerState::Installed, WorkerState::Activating, "activate").await?;
                match self.run_all(LifecycleEvent::Activate).await {
                    Ok(outcome) => {
                        *self.state.write().await = WorkerState::Activated;
                        Ok(outcome)
                    }
                    Err(err) => {
                        *self.state.write().await = WorkerState::Installed;
                        Err(err)
                    }
                }
            }
            LifecycleEvent::Fetch(request) => {
                if state != WorkerState::Activated {
                    return Ok(EventOutcome::Passthrough);
                }
                for handler in &self.handlers {
                    let outcome = handler.handle(LifecycleEvent::Fetch(request.clone()), self.runtime.as_ref()).await?;
                    if outcome != EventOutcome::Passthrough {
                        return Ok(outcome);
                    }
                }
                Ok(EventOutcome::Passthrough)
            }
        }
    }

    /// Move from `from` to `to` in one step under the write lock.
    async fn transition(&self, from: WorkerState, to: WorkerState, event: &str) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::Lifecycle(format!("{event} delivered in state {:?}", *state)));
        }
        *state = to;
        Ok(())
    }

    /// Run `event` through every handler, returning the last outcome.
    async fn run_all(&self, event: LifecycleEvent) -> Result<EventOutcome, Error> {
        let mut last = EventOutcome::Passthrough;
        for handler in &self.handlers {
            last = handler.handle(event.clone(), self.runtime.as_ref()).await?;
        }
        Ok(last)
    }
}

impl EventDispatch for LocalDispatcher {
    fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }
}
