//! The interception worker: install, activate and fetch handlers.

use std::sync::Arc;

use async_trait::async_trait;
use shellcache_client::{FetchClient, FetchConfig, PolicyExecutor, Transport};
use shellcache_core::{CacheDb, CacheStorage, ConfigError, Error, RequestDescriptor, Response, ShellConfig};
use url::Url;

use crate::events::{EventHandler, EventOutcome, LifecycleEvent, Runtime};
use crate::{generations, precache};

/// Binds lifecycle events to the precache routine, the generation sweep
/// and the policy executor.
pub struct ServiceWorker<S, T> {
    executor: PolicyExecutor<S, T>,
    precache: Vec<Url>,
}

impl<S, T> ServiceWorker<S, T>
where
    S: CacheStorage,
    T: Transport,
{
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope, document entry or a
    /// precache entry cannot be resolved.
    pub fn new(config: &ShellConfig, storage: Arc<S>, transport: Arc<T>) -> Result<Self, ConfigError> {
        let scope = config.scope_url()?;
        let precache = precache::resolve_assets(&scope, &config.precache)
            .map_err(|e| ConfigError::Invalid { field: "precache".into(), reason: e.to_string() })?;
        Ok(Self { executor: PolicyExecutor::new(config, storage, transport)?, precache })
    }

    pub fn executor(&self) -> &PolicyExecutor<S, T> {
        &self.executor
    }

    /// Resolved precache URLs, in configuration order.
    pub fn precache_urls(&self) -> &[Url] {
        &self.precache
    }

    /// Seed the current generation, then skip waiting.
    pub async fn install(&self, runtime: &dyn Runtime) -> Result<usize, Error> {
        let cache = self.executor.storage().open(self.executor.cache_name()).await?;
        let cached = precache::add_all(&cache, self.executor.transport().as_ref(), &self.precache).await?;
        runtime.skip_waiting().await;
        Ok(cached)
    }

    /// Delete every generation but the current one, then claim clients.
    pub async fn activate(&self, runtime: &dyn Runtime) -> Result<Vec<String>, Error> {
        let deleted = generations::sweep(self.executor.storage().as_ref(), self.executor.cache_name()).await?;
        runtime.claim_clients().await;
        Ok(deleted)
    }

    /// Serve an intercepted request; `None` means pass through.
    pub async fn fetch(&self, request: &RequestDescriptor) -> Result<Option<Response>, Error> {
        self.executor.handle(request).await
    }
}

impl ServiceWorker<CacheDb, FetchClient> {
    /// Build the production stack: the SQLite store at `db_path` and the
    /// reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid configuration, a cache error if
    /// the database cannot be opened and `Error::Network` if the HTTP client
    /// cannot be built.
    pub async fn from_config(config: &ShellConfig) -> Result<Self, Error> {
        config.validate()?;
        let storage = CacheDb::open(&config.db_path).await?;
        let transport = FetchClient::new(FetchConfig::from_shell(config))?;
        tracing::info!(
            cache_name = %config.cache_name,
            db_path = %config.db_path.display(),
            scope = %config.scope,
            "service worker ready"
        );
        Self::new(config, Arc::new(storage), Arc::new(transport)).map_err(Error::from)
    }
}

#[async_trait]
impl<S, T> EventHandler for ServiceWorker<S, T>
where
    S: CacheStorage,
    T: Transport,
{
    async fn handle(&self, event: LifecycleEvent, runtime: &dyn Runtime) -> Result<EventOutcome, Error> {
        match event {
            LifecycleEvent::Install => {
                let cached = self.install(runtime).await?;
                Ok(EventOutcome::Installed { cached })
            }
            LifecycleEvent::Activate => {
                let deleted = self.activate(runtime).await?;
                Ok(EventOutcome::Activated { deleted })
            }
            LifecycleEvent::Fetch(request) => Ok(match self.fetch(&request).await? {
                Some(response) => EventOutcome::Respond(response),
                None => EventOutcome::Passthrough,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config, fixture, fixture_with, url};
    use bytes::Bytes;
    use shellcache_core::{CacheHandle, Destination, RequestKey};

    #[test]
    fn test_new_rejects_unresolvable_precache() {
        let config = ShellConfig { precache: vec!["mailto:ops@app.test".into()], ..config() };
        let storage = Arc::new(shellcache_core::MemoryStorage::new());
        let transport = Arc::new(shellcache_client::testing::ScriptedTransport::new());
        let result = ServiceWorker::new(&config, storage, transport);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "precache"));
    }

    #[tokio::test]
    async fn test_install_seeds_current_generation_and_skips_waiting() {
        let f = fixture();
        f.serve_precache().await;

        let cached = f.worker.install(f.runtime.as_ref()).await.unwrap();

        assert_eq!(cached, 3);
        assert_eq!(f.runtime.skip_waiting_calls(), 1);
        let cache = f.storage.inner().open("app-shell-v4").await.unwrap();
        assert_eq!(cache.keys().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_install_failure_writes_nothing() {
        let f = fixture();
        f.transport.go_offline().await;

        assert!(f.worker.install(f.runtime.as_ref()).await.is_err());

        assert_eq!(f.runtime.skip_waiting_calls(), 0);
        assert_eq!(f.storage.counts().puts(), 0);
    }

    #[tokio::test]
    async fn test_precached_document_serves_first_offline_navigation() {
        let f = fixture();
        f.serve_precache().await;
        f.worker.install(f.runtime.as_ref()).await.unwrap();

        f.transport.go_offline().await;
        let res = f
            .worker
            .fetch(&shellcache_core::RequestDescriptor::navigate(url("/reports")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.body, Bytes::from(format!("precached {}", url("/index.html"))));
    }

    // Scenario D
    #[tokio::test]
    async fn test_activate_deletes_prior_generation_only() {
        let f = fixture();
        let key = RequestKey::get(&url("/app.js"));
        let prior = f.storage.inner().open("app-shell-v3").await.unwrap();
        prior.put(&key, &Response::new(200, "old js")).await.unwrap();
        let current = f.storage.inner().open("app-shell-v4").await.unwrap();
        current.put(&key, &Response::new(200, "new js")).await.unwrap();

        let deleted = f.worker.activate(f.runtime.as_ref()).await.unwrap();

        assert_eq!(deleted, vec!["app-shell-v3".to_string()]);
        assert_eq!(f.runtime.claim_clients_calls(), 1);
        assert_eq!(f.storage.inner().keys().await.unwrap(), vec!["app-shell-v4".to_string()]);
        let kept = current.match_request(&key).await.unwrap().unwrap();
        assert_eq!(kept.body, Bytes::from_static(b"new js"));
    }

    #[tokio::test]
    async fn test_new_version_tag_supersedes_old_generation() {
        let v4 = fixture();
        v4.serve_precache().await;
        v4.worker.install(v4.runtime.as_ref()).await.unwrap();

        let v5_config = ShellConfig { cache_name: "app-shell-v5".into(), ..config() };
        let storage = Arc::clone(&v4.storage);
        let v5 = ServiceWorker::new(&v5_config, storage, Arc::clone(&v4.transport)).unwrap();
        v5.install(v4.runtime.as_ref()).await.unwrap();
        let deleted = v5.activate(v4.runtime.as_ref()).await.unwrap();

        assert_eq!(deleted, vec!["app-shell-v4".to_string()]);
        assert_eq!(v4.storage.inner().keys().await.unwrap(), vec!["app-shell-v5".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_handler_outcomes() {
        let f = fixture_with(&config());
        f.transport.respond(url("/app.js"), Response::new(200, "js")).await;
        let req = shellcache_core::RequestDescriptor::get(url("/app.js")).with_destination(Destination::Script);

        let outcome = f.worker.handle(LifecycleEvent::Fetch(req.clone()), f.runtime.as_ref()).await.unwrap();
        assert_eq!(outcome, EventOutcome::Respond(Response::new(200, "js")));

        let post = req.with_method(shellcache_core::Method::Post);
        let outcome = f.worker.handle(LifecycleEvent::Fetch(post), f.runtime.as_ref()).await.unwrap();
        assert_eq!(outcome, EventOutcome::Passthrough);
    }

    #[tokio::test]
    async fn test_from_config_installs_into_sqlite_and_serves_offline_navigation() {
        use std::time::Duration;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<main>shell</main>", "text/html"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<main>root</main>", "text/html"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = ShellConfig {
            precache: vec!["./".into(), "./index.html".into()],
            db_path: dir.path().join("shell.sqlite"),
            timeout_ms: 500,
            ..ShellConfig::for_scope(format!("{}/", server.uri()))
        };
        let runtime = crate::test_support::CountingRuntime::default();

        let worker = ServiceWorker::from_config(&config).await.unwrap();
        assert_eq!(worker.install(&runtime).await.unwrap(), 2);

        // the origin stops answering in time
        server.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let nav = RequestDescriptor::navigate(Url::parse(&format!("{}/reports", server.uri())).unwrap());
        let res = worker.fetch(&nav).await.unwrap().unwrap();
        assert_eq!(res.body, Bytes::from_static(b"<main>shell</main>"));

        let reopened = CacheDb::open(&config.db_path).await.unwrap();
        let cache = reopened.open(&config.cache_name).await.unwrap();
        assert_eq!(cache.keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_from_config_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShellConfig {
            cache_name: " ".into(),
            db_path: dir.path().join("shell.sqlite"),
            ..config()
        };
        let err = ServiceWorker::from_config(&config).await.err().unwrap();
        assert!(matches!(err, Error::Config(ConfigError::Invalid { ref field, .. }) if field == "cache_name"));
        assert!(!config.db_path.exists());
    }
}
