use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shellcache_client::testing::{RecordingStorage, ScriptedTransport};
use shellcache_core::{MemoryStorage, Response, ShellConfig};
use url::Url;

use crate::events::Runtime;
use crate::worker::ServiceWorker;

pub const SCOPE: &str = "https://app.test/";

#[derive(Default)]
pub struct CountingRuntime {
    skip_waiting: AtomicUsize,
    claim_clients: AtomicUsize,
}

impl CountingRuntime {
    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_clients_calls(&self) -> usize {
        self.claim_clients.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runtime for CountingRuntime {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim_clients(&self) {
        self.claim_clients.fetch_add(1, Ordering::SeqCst);
    }
}

pub type TestWorker = ServiceWorker<RecordingStorage<MemoryStorage>, ScriptedTransport>;

pub struct Fixture {
    pub worker: Arc<TestWorker>,
    pub storage: Arc<RecordingStorage<MemoryStorage>>,
    pub transport: Arc<ScriptedTransport>,
    pub runtime: Arc<CountingRuntime>,
}

pub fn url(path: &str) -> Url {
    Url::parse(SCOPE).unwrap().join(path).unwrap()
}

pub fn config() -> ShellConfig {
    ShellConfig {
        precache: vec!["./".into(), "./index.html".into(), "https://cdn.test/lib.js".into()],
        ..ShellConfig::for_scope(SCOPE)
    }
}

pub fn fixture_with(config: &ShellConfig) -> Fixture {
    let storage = Arc::new(RecordingStorage::new(MemoryStorage::new()));
    let transport = Arc::new(ScriptedTransport::new());
    let worker = Arc::new(ServiceWorker::new(config, Arc::clone(&storage), Arc::clone(&transport)).unwrap());
    Fixture { worker, storage, transport, runtime: Arc::new(CountingRuntime::default()) }
}

pub fn fixture() -> Fixture {
    fixture_with(&config())
}

impl Fixture {
    /// Script ok responses for every precache URL.
    pub async fn serve_precache(&self) {
        for url in self.worker.precache_urls() {
            self.transport.respond(url.clone(), Response::new(200, format!("precached {url}"))).await;
        }
    }
}
