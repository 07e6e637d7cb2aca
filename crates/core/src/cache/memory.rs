//! In-process cache store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheHandle, CacheStorage};
use crate::{Error, RequestKey, Response};

struct StoredEntry {
    seq: u64,
    key: RequestKey,
    response: Response,
}

#[derive(Default)]
struct Entries {
    deleted: bool,
    next_seq: u64,
    by_digest: HashMap<String, StoredEntry>,
}

type SharedEntries = Arc<RwLock<Entries>>;

/// Cache store kept entirely in memory.
///
/// Clones share the same generations.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    generations: Arc<RwLock<Vec<(String, SharedEntries)>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    type Handle = MemoryGeneration;

    async fn open(&self, name: &str) -> Result<MemoryGeneration, Error> {
        {
            let generations = self.generations.read().await;
            if let Some((_, entries)) = generations.iter().find(|(n, _)| n == name) {
                return Ok(MemoryGeneration { name: name.to_string(), entries: Arc::clone(entries) });
            }
        }

        let mut generations = self.generations.write().await;
        // another opener may have won the race between the two locks
        if let Some((_, entries)) = generations.iter().find(|(n, _)| n == name) {
            return Ok(MemoryGeneration { name: name.to_string(), entries: Arc::clone(entries) });
        }
        let entries = SharedEntries::default();
        generations.push((name.to_string(), Arc::clone(&entries)));
        tracing::debug!(generation = name, "created cache generation");
        Ok(MemoryGeneration { name: name.to_string(), entries })
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.generations.read().await.iter().any(|(n, _)| n == name))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.generations.read().await.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let removed = {
            let mut generations = self.generations.write().await;
            let Some(index) = generations.iter().position(|(n, _)| n == name) else {
                return Ok(false);
            };
            generations.remove(index).1
        };

        let mut entries = removed.write().await;
        entries.by_digest.clear();
        entries.deleted = true;
        tracing::debug!(generation = name, "deleted cache generation");
        Ok(true)
    }
}

/// Handle to one in-memory generation.
///
/// Once its generation is deleted the handle matches nothing and rejects
/// writes with `Error::GenerationDeleted`, like a handle into [`CacheDb`].
///
/// [`CacheDb`]: super::CacheDb
pub struct MemoryGeneration {
    name: String,
    entries: SharedEntries,
}

#[async_trait]
impl CacheHandle for MemoryGeneration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.by_digest.get(&key.digest()).map(|e| e.response.clone()))
    }

    async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        if entries.deleted {
            return Err(Error::GenerationDeleted(self.name.clone()));
        }
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries
            .by_digest
            .insert(key.digest(), StoredEntry { seq, key: key.clone(), response: response.clone() });
        Ok(())
    }

    async fn put_all(&self, batch: &[(RequestKey, Response)]) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        if entries.deleted {
            return Err(Error::GenerationDeleted(self.name.clone()));
        }
        for (key, response) in batch {
            let seq = entries.next_seq;
            entries.next_seq += 1;
            entries
                .by_digest
                .insert(key.digest(), StoredEntry { seq, key: key.clone(), response: response.clone() });
        }
        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        Ok(self.entries.write().await.by_digest.remove(&key.digest()).is_some())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let entries = self.entries.read().await;
        let mut stored: Vec<&StoredEntry> = entries.by_digest.values().collect();
        stored.sort_by_key(|e| e.seq);
        Ok(stored.into_iter().map(|e| e.key.clone()).collect())
    }
}
