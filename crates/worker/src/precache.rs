//! Install-time seeding of the current generation.
//!
//! All-or-nothing: every asset is fetched first, and entries are written only
//! when every response is ok. A single network failure or non-ok status
//! rejects the install and leaves the generation untouched.

use futures_util::future::try_join_all;
use shellcache_client::fetch::{FetchOptions, Transport, resolve};
use shellcache_core::{CacheHandle, Error, RequestDescriptor, RequestKey, Response};
use url::Url;

/// Resolve precache entries against the application scope.
///
/// # Errors
///
/// Returns `Error::InvalidUrl` for the first entry that does not resolve.
pub fn resolve_assets(scope: &Url, entries: &[String]) -> Result<Vec<Url>, Error> {
    entries
        .iter()
        .map(|entry| resolve(scope, entry).map_err(|e| Error::InvalidUrl(format!("precache entry {entry:?}: {e}"))))
        .collect()
}

/// Fetch every URL and store the responses in `cache`.
///
/// Returns the number of entries written.
pub async fn add_all<H, T>(cache: &H, transport: &T, urls: &[Url]) -> Result<usize, Error>
where
    H: CacheHandle + ?Sized,
    T: Transport + ?Sized,
{
    let fetches = urls.iter().map(|url| async move {
        let request = RequestDescriptor::get(url.clone());
        let response = transport.fetch(&request, FetchOptions::default()).await?;
        if !response.ok() {
            return Err(Error::PrecacheFailed { url: url.to_string(), status: response.status });
        }
        Ok::<(RequestKey, Response), Error>((request.key(), response))
    });

    let entries = try_join_all(fetches).await?;
    cache.put_all(&entries).await?;

    tracing::info!(generation = cache.name(), count = entries.len(), "precached assets");
    Ok(entries.len())
}
