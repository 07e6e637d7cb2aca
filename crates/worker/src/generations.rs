//! Activation-time removal of superseded generations.

use shellcache_core::{CacheStorage, Error};

/// Delete every generation except `current`.
///
/// Returns the names that were deleted, oldest first. The current generation
/// is left alone whether or not it exists.
pub async fn sweep<S>(storage: &S, current: &str) -> Result<Vec<String>, Error>
where
    S: CacheStorage + ?Sized,
{
    let mut deleted = Vec::new();
    for name in storage.keys().await? {
        if name == current {
            continue;
        }
        if storage.delete(&name).await? {
            tracing::info!(generation = %name, current, "deleted stale cache generation");
            deleted.push(name);
        }
    }
    Ok(deleted)
}
