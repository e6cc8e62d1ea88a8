//! Time-cached reference sets (blacklist, employer allowlist).
//!
//! The snapshot is read, and conditionally replaced after a fetch. The lock is
//! never held across the fetch, so concurrent refreshes may both hit the
//! upstream; the last write wins.

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::error::SourceError;

struct Snapshot<K> {
    entries: HashSet<K>,
    fetched_at: Option<Instant>,
}

/// A lazily refreshed set of normalized keys.
pub struct CachedSet<K> {
    label: &'static str,
    ttl: Duration,
    snapshot: RwLock<Snapshot<K>>,
}

impl<K> CachedSet<K>
where
    K: Eq + Hash + Send + Sync,
{
    pub fn new(label: &'static str, ttl: Duration) -> Self {
        Self {
            label,
            ttl,
            snapshot: RwLock::new(Snapshot {
                entries: HashSet::new(),
                fetched_at: None,
            }),
        }
    }

    /// Empty, never fetched, or older than the TTL.
    pub async fn needs_refresh(&self) -> bool {
        let snapshot = self.snapshot.read().await;
        match snapshot.fetched_at {
            None => true,
            Some(_) if snapshot.entries.is_empty() => true,
            Some(at) => at.elapsed() > self.ttl,
        }
    }

    /// Refresh from `fetch` when stale. A failed fetch keeps the previous snapshot.
    pub async fn refresh_with<F, Fut>(&self, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<HashSet<K>, SourceError>>,
    {
        if !self.needs_refresh().await {
            return;
        }

        match fetch().await {
            Ok(entries) => {
                tracing::info!(cache = self.label, entries = entries.len(), "Refreshed reference set");
                let mut snapshot = self.snapshot.write().await;
                snapshot.entries = entries;
                snapshot.fetched_at = Some(Instant::now());
            }
            Err(e) => {
                let kept = self.snapshot.read().await.entries.len();
                tracing::warn!(
                    cache = self.label,
                    error = %e,
                    kept,
                    "Reference set refresh failed, keeping previous snapshot"
                );
            }
        }
    }

    pub async fn contains(&self, key: &K) -> bool {
        self.snapshot.read().await.entries.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
