//! Test doubles for the transport and the cache store.
//!
//! Enabled inside this crate's tests and, for downstream crates, with the
//! `testing` feature.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shellcache_core::{CacheHandle, CacheStorage, Error, RequestDescriptor, RequestKey, Response};
use tokio::sync::Mutex;
use url::Url;

use crate::fetch::{FetchOptions, Transport};

#[derive(Clone)]
enum Scripted {
    Respond(Response),
    Fail,
}

#[derive(Default)]
struct Script {
    offline: bool,
    routes: HashMap<Url, Scripted>,
    calls: Vec<(RequestDescriptor, FetchOptions)>,
}

/// Transport answering from a per-URL script.
///
/// Unscripted URLs answer 404. Every call is logged, including failed ones.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `response` from now on.
    pub async fn respond(&self, url: Url, response: Response) {
        let mut script = self.script.lock().await;
        script.offline = false;
        script.routes.insert(url, Scripted::Respond(response));
    }

    /// Fail every fetch of `url` with a network error.
    pub async fn fail(&self, url: Url) {
        self.script.lock().await.routes.insert(url, Scripted::Fail);
    }

    /// Fail every fetch with a network error until the next `respond`.
    pub async fn go_offline(&self) {
        self.script.lock().await.offline = true;
    }

    /// Requests seen so far, with the options they were sent with.
    pub async fn calls(&self) -> Vec<(RequestDescriptor, FetchOptions)> {
        self.script.lock().await.calls.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &RequestDescriptor, options: FetchOptions) -> Result<Response, Error> {
        let mut script = self.script.lock().await;
        script.calls.push((request.clone(), options));

        if script.offline {
            return Err(Error::Network(format!("offline: {}", request.url())));
        }
        match script.routes.get(request.url()) {
            Some(Scripted::Respond(response)) => Ok(response.clone()),
            Some(Scripted::Fail) => Err(Error::Network(format!("connection reset: {}", request.url()))),
            None => Ok(Response::new(404, "not found").with_status_text("Not Found")),
        }
    }
}

/// Per-operation call counters shared by a store and its handles.
#[derive(Debug, Default)]
pub struct CallCounts {
    opens: AtomicUsize,
    has: AtomicUsize,
    generation_keys: AtomicUsize,
    generation_deletes: AtomicUsize,
    matches: AtomicUsize,
    puts: AtomicUsize,
    entry_deletes: AtomicUsize,
    entry_keys: AtomicUsize,
}

impl CallCounts {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn matches(&self) -> usize {
        self.matches.load(Ordering::SeqCst)
    }

    /// Entries written, counting each entry of a batch.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn generation_deletes(&self) -> usize {
        self.generation_deletes.load(Ordering::SeqCst)
    }

    /// Every call on the store or any of its handles.
    pub fn total(&self) -> usize {
        [
            &self.opens,
            &self.has,
            &self.generation_keys,
            &self.generation_deletes,
            &self.matches,
            &self.puts,
            &self.entry_deletes,
            &self.entry_keys,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

fn bump(counter: &AtomicUsize, by: usize) {
    counter.fetch_add(by, Ordering::SeqCst);
}

/// Store wrapper that counts every call before delegating.
pub struct RecordingStorage<S> {
    inner: S,
    counts: Arc<CallCounts>,
}

impl<S: CacheStorage> RecordingStorage<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, counts: Arc::default() }
    }

    /// The wrapped store; calls made through it are not counted.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn counts(&self) -> &CallCounts {
        &self.counts
    }
}

#[async_trait]
impl<S: CacheStorage> CacheStorage for RecordingStorage<S> {
    type Handle = RecordingHandle<S::Handle>;

    async fn open(&self, name: &str) -> Result<Self::Handle, Error> {
        bump(&self.counts.opens, 1);
        let inner = self.inner.open(name).await?;
        Ok(RecordingHandle { inner, counts: Arc::clone(&self.counts) })
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        bump(&self.counts.has, 1);
        self.inner.has(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        bump(&self.counts.generation_keys, 1);
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        bump(&self.counts.generation_deletes, 1);
        self.inner.delete(name).await
    }
}

/// Handle wrapper produced by [`RecordingStorage`].
pub struct RecordingHandle<H> {
    inner: H,
    counts: Arc<CallCounts>,
}

#[async_trait]
impl<H: CacheHandle> CacheHandle for RecordingHandle<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        bump(&self.counts.matches, 1);
        self.inner.match_request(key).await
    }

    async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error> {
        bump(&self.counts.puts, 1);
        self.inner.put(key, response).await
    }

    async fn put_all(&self, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        bump(&self.counts.puts, entries.len());
        self.inner.put_all(entries).await
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        bump(&self.counts.entry_deletes, 1);
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        bump(&self.counts.entry_keys, 1);
        self.inner.keys().await
    }
}
