// ABOUTME: In-memory nutrition cache with LRU eviction and name/keyword indexes
// ABOUTME: Optional background task drops entries past the retention window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::{BTreeSet, HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::{sort_newest_first, NutritionCacheStore};
use crate::config::NutritionCacheConfig;
use crate::constants::cache::MAX_KEYWORD_CANDIDATES;
use crate::errors::AppResult;
use crate::models::NutritionCacheEntry;

/// Entry store plus secondary indexes, kept consistent under one lock
struct MemoryState {
    entries: LruCache<Uuid, NutritionCacheEntry>,
    by_name: HashMap<String, Vec<Uuid>>,
    by_keyword: HashMap<String, HashSet<Uuid>>,
}

impl MemoryState {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            by_name: HashMap::new(),
            by_keyword: HashMap::new(),
        }
    }

    fn insert(&mut self, entry: NutritionCacheEntry) {
        let id = entry.id;
        self.by_name
            .entry(entry.food_name.clone())
            .or_default()
            .push(id);
        for keyword in &entry.search_keywords {
            self.by_keyword
                .entry(keyword.clone())
                .or_default()
                .insert(id);
        }

        // push returns the evicted LRU entry when at capacity
        if let Some((evicted_id, evicted)) = self.entries.push(id, entry) {
            if evicted_id != id {
                self.unindex(&evicted);
            }
        }
    }

    fn remove(&mut self, id: &Uuid) {
        if let Some(entry) = self.entries.pop(id) {
            self.unindex(&entry);
        }
    }

    fn unindex(&mut self, entry: &NutritionCacheEntry) {
        if let Some(ids) = self.by_name.get_mut(&entry.food_name) {
            ids.retain(|id| *id != entry.id);
            if ids.is_empty() {
                self.by_name.remove(&entry.food_name);
            }
        }
        for keyword in &entry.search_keywords {
            if let Some(ids) = self.by_keyword.get_mut(keyword) {
                ids.remove(&entry.id);
                if ids.is_empty() {
                    self.by_keyword.remove(keyword);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
        self.by_keyword.clear();
    }
}

/// In-memory nutrition cache
///
/// Uses `Arc<RwLock<..>>` so the optional cleanup task can share the store.
/// `LruCache` bounds memory by evicting the least recently read entry.
#[derive(Clone)]
pub struct InMemoryNutritionCache {
    state: Arc<RwLock<MemoryState>>,
    shutdown_tx: Option<Arc<mpsc::Sender<()>>>,
}

impl InMemoryNutritionCache {
    /// Capacity used when configuration asks for zero entries
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a cache with the given configuration
    ///
    /// Background cleanup requires a running tokio runtime and a configured
    /// retention window.
    #[must_use]
    pub fn new(config: &NutritionCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        let state = Arc::new(RwLock::new(MemoryState::new(capacity)));

        let shutdown_tx = match config.retention_secs {
            Some(retention_secs) if config.enable_background_cleanup => {
                let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
                let state_clone = state.clone();
                let cleanup_interval = Duration::from_secs(config.cleanup_interval_secs.max(1));

                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(cleanup_interval);
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                Self::cleanup_expired(&state_clone, retention_secs).await;
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("Nutrition cache cleanup task received shutdown signal");
                                break;
                            }
                        }
                    }
                });

                Some(Arc::new(shutdown_tx))
            }
            _ => None,
        };

        Self { state, shutdown_tx }
    }

    /// Cache with `max_entries` capacity and no background task
    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        Self::new(&NutritionCacheConfig {
            max_entries,
            enable_background_cleanup: false,
            ..NutritionCacheConfig::default()
        })
    }

    async fn cleanup_expired(state: &Arc<RwLock<MemoryState>>, retention_secs: u64) {
        let cutoff = Utc::now()
            - chrono::Duration::seconds(i64::try_from(retention_secs).unwrap_or(i64::MAX));
        let mut guard = state.write().await;

        let expired: Vec<Uuid> = guard
            .entries
            .iter()
            .filter(|(_, entry)| entry.created_at < cutoff)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            guard.remove(id);
        }
        drop(guard);

        if !expired.is_empty() {
            debug!("Dropped {} nutrition cache entries past retention", expired.len());
        }
    }
}

#[async_trait]
impl NutritionCacheStore for InMemoryNutritionCache {
    async fn find_exact(&self, food_name: &str) -> AppResult<Option<NutritionCacheEntry>> {
        let name = NutritionCacheEntry::normalize_name(food_name);
        let mut guard = self.state.write().await;

        let Some(ids) = guard.by_name.get(&name).cloned() else {
            return Ok(None);
        };

        // LruCache::get is mutable (refreshes recency), hence the write lock
        let newest = ids
            .iter()
            .filter_map(|id| guard.entries.get(id).cloned())
            .max_by(|a, b| a.created_at.cmp(&b.created_at));
        drop(guard);
        Ok(newest)
    }

    async fn find_by_keywords(
        &self,
        keywords: &BTreeSet<String>,
    ) -> AppResult<Vec<NutritionCacheEntry>> {
        let guard = self.state.read().await;

        let ids: HashSet<Uuid> = keywords
            .iter()
            .filter_map(|keyword| guard.by_keyword.get(keyword))
            .flat_map(|ids| ids.iter().copied())
            .collect();
        let mut entries: Vec<NutritionCacheEntry> = ids
            .iter()
            .filter_map(|id| guard.entries.peek(id).cloned())
            .collect();
        drop(guard);

        sort_newest_first(&mut entries);
        entries.truncate(MAX_KEYWORD_CANDIDATES);
        Ok(entries)
    }

    async fn append(&self, entry: NutritionCacheEntry) -> AppResult<()> {
        self.state.write().await.insert(entry);
        Ok(())
    }

    async fn entry_count(&self) -> AppResult<usize> {
        Ok(self.state.read().await.entries.len())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.state.write().await.clear();
        Ok(())
    }
}

impl Drop for InMemoryNutritionCache {
    fn drop(&mut self) {
        // Only the last clone holding the sender actually stops the task
        if let Some(tx) = &self.shutdown_tx {
            if Arc::strong_count(tx) == 1 {
                if let Err(e) = tx.try_send(()) {
                    debug!(error = ?e, "Cache shutdown signal send failed (channel likely closed)");
                }
            }
        }
    }
}
