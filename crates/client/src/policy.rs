//! Caching strategies applied per request category.
//!
//! | Category    | Strategy      | Cache reads | Cache writes          |
//! |-------------|---------------|-------------|-----------------------|
//! | RemoteData  | network-only  | never       | never                 |
//! | Document    | network-first | on failure  | ok responses, fixed key |
//! | StaticAsset | cache-first   | always      | ok responses on miss  |
//! | Other       | network-only  | never       | never                 |
//!
//! Only ok (2xx) responses are written. Cache-store errors are not recovered
//! from; they fail the request.

use std::sync::Arc;

use shellcache_core::{
    CacheHandle, CacheStorage, ConfigError, Error, RequestDescriptor, RequestKey, Response, ShellConfig,
};

use crate::classify::{Classifier, RequestCategory, Strategy};
use crate::fetch::{FetchOptions, Transport};

/// Applies the strategy for each category against one cache generation.
pub struct PolicyExecutor<S, T> {
    cache_name: String,
    document_key: RequestKey,
    classifier: Classifier,
    storage: Arc<S>,
    transport: Arc<T>,
}

impl<S, T> PolicyExecutor<S, T>
where
    S: CacheStorage,
    T: Transport,
{
    /// Build an executor writing to the generation named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the document URL cannot be formed.
    pub fn new(config: &ShellConfig, storage: Arc<S>, transport: Arc<T>) -> Result<Self, ConfigError> {
        Ok(Self {
            cache_name: config.cache_name.clone(),
            document_key: RequestKey::get(&config.document_url()?),
            classifier: Classifier::new(config),
            storage,
            transport,
        })
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Identity every document response is stored under.
    pub fn document_key(&self) -> &RequestKey {
        &self.document_key
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Handle an intercepted request.
    ///
    /// Returns `Ok(None)` when the request is not intercepted and the runtime
    /// should perform its default behavior.
    pub async fn handle(&self, request: &RequestDescriptor) -> Result<Option<Response>, Error> {
        let Some(category) = self.classifier.route(request) else {
            tracing::trace!(method = %request.method(), url = %request.url(), "passing through");
            return Ok(None);
        };
        self.execute(category, request).await.map(Some)
    }

    /// Serve `request` with the strategy bound to `category`.
    pub async fn execute(&self, category: RequestCategory, request: &RequestDescriptor) -> Result<Response, Error> {
        tracing::debug!(category = %category, url = %request.url(), "intercepted");
        match category.strategy() {
            Strategy::NetworkOnly => self.network_only(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }

    /// Forward to the network; the cache is never touched.
    pub async fn network_only(&self, request: &RequestDescriptor) -> Result<Response, Error> {
        self.transport.fetch(request, FetchOptions::default()).await
    }

    /// Fresh copy from the network, stored under the document key; the stored
    /// copy (or a network-error response) when the network is unreachable.
    pub async fn network_first(&self, request: &RequestDescriptor) -> Result<Response, Error> {
        match self.transport.fetch(request, FetchOptions::bypass_cache()).await {
            Ok(response) => {
                if response.ok() {
                    let cache = self.storage.open(&self.cache_name).await?;
                    cache.put(&self.document_key, &response).await?;
                } else {
                    tracing::debug!(status = response.status, url = %request.url(), "document not stored");
                }
                Ok(response)
            }
            Err(err) if err.is_network() => {
                let cache = self.storage.open(&self.cache_name).await?;
                match cache.match_request(&self.document_key).await? {
                    Some(cached) => {
                        tracing::warn!(url = %request.url(), error = %err, "network failed, serving cached document");
                        Ok(cached)
                    }
                    None => {
                        tracing::warn!(url = %request.url(), error = %err, "network failed, no cached document");
                        Ok(Response::error())
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Cached copy if present, otherwise the network; ok network responses
    /// are stored for next time.
    pub async fn cache_first(&self, request: &RequestDescriptor) -> Result<Response, Error> {
        let key = request.key();
        let cache = self.storage.open(&self.cache_name).await?;

        if let Some(cached) = cache.match_request(&key).await? {
            tracing::debug!(key = %key, "cache hit");
            return Ok(cached);
        }

        tracing::debug!(key = %key, "cache miss");
        let response = self.transport.fetch(request, FetchOptions::default()).await?;
        if response.ok() {
            cache.put(&key, &response).await?;
        }
        Ok(response)
    }
}
