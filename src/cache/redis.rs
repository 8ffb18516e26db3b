// ABOUTME: Redis nutrition cache backend with connection management and retry
// ABOUTME: Entries stored as JSON with bounded name-list and keyword sorted-set indexes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use tracing::{error, info, warn};

use super::{sort_newest_first, NutritionCacheStore};
use crate::config::{NutritionCacheConfig, RedisConnectionConfig};
use crate::constants::cache::{
    CACHE_KEY_PREFIX, ENTRY_KEY_SEGMENT, KEYWORD_KEY_SEGMENT, MAX_KEYWORD_CANDIDATES,
    NAME_INDEX_DEPTH, NAME_KEY_SEGMENT,
};
use crate::errors::{AppError, AppResult};
use crate::models::NutritionCacheEntry;

/// Redis-backed nutrition cache for multi-instance deployments
///
/// Layout under [`CACHE_KEY_PREFIX`]:
/// - `entry:{id}`: JSON entry (expires with the retention window, if any)
/// - `name:{normalized name}`: list of the newest [`NAME_INDEX_DEPTH`] entry
///   ids in append order
/// - `kw:{keyword}`: sorted set of the newest [`MAX_KEYWORD_CANDIDATES`]
///   entry ids scored by creation time in milliseconds
///
/// Every append trims both indexes and, with a retention window, refreshes
/// their expiry and drops keyword ids older than the window. Ids whose entry
/// has expired in between are skipped on read, and so are payloads that no
/// longer decode.
#[derive(Clone)]
pub struct RedisNutritionCache {
    manager: ConnectionManager,
    retention_secs: Option<u64>,
}

impl RedisNutritionCache {
    /// Connect using the cache configuration
    ///
    /// # Errors
    ///
    /// Returns an error if no Redis URL is configured or the connection fails
    pub async fn connect(config: &NutritionCacheConfig) -> AppResult<Self> {
        let Some(url) = config.redis_url.as_deref() else {
            return Err(AppError::config("REDIS_URL is not set"));
        };
        let client = redis::Client::open(url)
            .map_err(|e| AppError::config(format!("Invalid Redis URL: {e}")))?;
        let manager = Self::open_manager(&client, &config.redis_connection).await?;

        info!(retention_secs = ?config.retention_secs, "Redis nutrition cache connected");
        Ok(Self {
            manager,
            retention_secs: config.retention_secs,
        })
    }

    /// Open a connection manager, backing off between startup attempts
    ///
    /// Once established the manager reconnects on its own using the same
    /// retry settings.
    async fn open_manager(
        client: &redis::Client,
        settings: &RedisConnectionConfig,
    ) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(settings.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(settings.response_timeout_secs))
            .set_number_of_retries(settings.reconnection_retries)
            .set_exponent_base(settings.retry_exponent_base)
            .set_max_delay(settings.max_retry_delay_ms);

        let attempts = settings.initial_connection_retries.saturating_add(1);
        let mut backoff = Duration::from_millis(settings.initial_retry_delay_ms);
        let ceiling = Duration::from_millis(settings.max_retry_delay_ms);
        let mut attempt = 1;
        loop {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await
            {
                Ok(manager) => return Ok(manager),
                Err(e) if attempt < attempts => {
                    warn!(
                        attempt,
                        attempts,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Redis not reachable yet"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(ceiling);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(AppError::storage(format!(
                        "Redis unreachable after {attempts} attempts"
                    ))
                    .with_source(e));
                }
            }
        }
    }

    fn entry_key(id: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{ENTRY_KEY_SEGMENT}{id}")
    }

    fn name_key(name: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{NAME_KEY_SEGMENT}{name}")
    }

    fn keyword_key(keyword: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{KEYWORD_KEY_SEGMENT}{keyword}")
    }

    fn redis_error(operation: &str, e: &redis::RedisError) -> AppError {
        error!(operation, error = %e, "Redis command failed");
        AppError::storage(format!("Nutrition cache {operation} failed: {e}"))
    }

    /// Load entries by id, skipping expired and undecodable ones
    async fn load_entries(&self, ids: &[String]) -> AppResult<Vec<NutritionCacheEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| Self::entry_key(id)).collect();
        let mut conn = self.manager.clone();

        let payloads: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::redis_error("MGET", &e))?;

        Ok(decode_entries(ids.iter().map(String::as_str).zip(payloads)))
    }

    /// Every key matching `pattern`, walked with non-blocking `SCAN`
    async fn scan_keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        let mut conn = self.manager.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg(&["MATCH", pattern, "COUNT", "100"])
                .query_async(&mut conn)
                .await
                .map_err(|e| Self::redis_error("SCAN", &e))?;
            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }
}

#[async_trait]
impl NutritionCacheStore for RedisNutritionCache {
    async fn find_exact(&self, food_name: &str) -> AppResult<Option<NutritionCacheEntry>> {
        let name = NutritionCacheEntry::normalize_name(food_name);
        let mut conn = self.manager.clone();

        let ids: Vec<String> = conn
            .lrange(Self::name_key(&name), -index_depth(NAME_INDEX_DEPTH), -1)
            .await
            .map_err(|e| Self::redis_error("LRANGE", &e))?;

        let entries = self.load_entries(&ids).await?;
        Ok(entries
            .into_iter()
            .max_by(|a, b| a.created_at.cmp(&b.created_at)))
    }

    async fn find_by_keywords(
        &self,
        keywords: &BTreeSet<String>,
    ) -> AppResult<Vec<NutritionCacheEntry>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.manager.clone();

        // the newest candidates overall are among the newest of each keyword
        let mut pipe = redis::pipe();
        for keyword in keywords {
            pipe.zrevrange(
                Self::keyword_key(keyword),
                0,
                index_depth(MAX_KEYWORD_CANDIDATES) - 1,
            );
        }
        let per_keyword: Vec<Vec<String>> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::redis_error("ZREVRANGE", &e))?;

        let ids: Vec<String> = per_keyword
            .into_iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut entries = self.load_entries(&ids).await?;
        sort_newest_first(&mut entries);
        entries.truncate(MAX_KEYWORD_CANDIDATES);
        Ok(entries)
    }

    async fn append(&self, entry: NutritionCacheEntry) -> AppResult<()> {
        let id = entry.id.to_string();
        let payload = serde_json::to_vec(&entry)?;
        let created_ms = entry.created_at.timestamp_millis();
        let name_key = Self::name_key(&entry.food_name);
        let mut conn = self.manager.clone();

        let mut pipe = redis::pipe();
        pipe.atomic();
        match self.retention_secs {
            Some(secs) => pipe.set_ex(Self::entry_key(&id), payload, secs).ignore(),
            None => pipe.set(Self::entry_key(&id), payload).ignore(),
        };
        pipe.rpush(&name_key, &id).ignore();
        pipe.ltrim(&name_key, -index_depth(NAME_INDEX_DEPTH), -1).ignore();
        let expiry = self.retention_secs.map(|secs| i64::try_from(secs).unwrap_or(i64::MAX));
        if let Some(secs) = expiry {
            pipe.expire(&name_key, secs).ignore();
        }

        for keyword in &entry.search_keywords {
            let key = Self::keyword_key(keyword);
            pipe.zadd(&key, &id, created_ms).ignore();
            pipe.zremrangebyrank(&key, 0, -index_depth(MAX_KEYWORD_CANDIDATES) - 1)
                .ignore();
            if let Some(secs) = expiry {
                let cutoff = created_ms.saturating_sub(secs.saturating_mul(1000));
                pipe.zrembyscore(&key, "-inf", format!("({cutoff}")).ignore();
                pipe.expire(&key, secs).ignore();
            }
        }

        let (): () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::redis_error("append", &e))?;
        Ok(())
    }

    async fn entry_count(&self) -> AppResult<usize> {
        let pattern = format!("{CACHE_KEY_PREFIX}{ENTRY_KEY_SEGMENT}*");
        Ok(self.scan_keys(&pattern).await?.len())
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Self::redis_error("PING", &e))?;
        if pong.eq_ignore_ascii_case("pong") {
            return Ok(());
        }
        Err(AppError::storage(format!("Redis answered PING with {pong:?}")))
    }

    async fn clear_all(&self) -> AppResult<()> {
        // Only our namespace, so a shared Redis instance is safe
        let keys = self.scan_keys(&format!("{CACHE_KEY_PREFIX}*")).await?;
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        for chunk in keys.chunks(500) {
            let _: u64 = conn
                .del(chunk)
                .await
                .map_err(|e| Self::redis_error("DEL", &e))?;
        }
        Ok(())
    }
}

/// Index depths as Redis list/rank offsets
fn index_depth(depth: usize) -> isize {
    isize::try_from(depth).unwrap_or(isize::MAX)
}

/// Decode `MGET` results, dropping expired ids and logging corrupt payloads
fn decode_entries<'a, I>(payloads: I) -> Vec<NutritionCacheEntry>
where
    I: IntoIterator<Item = (&'a str, Option<Vec<u8>>)>,
{
    payloads
        .into_iter()
        .filter_map(|(id, payload)| {
            let bytes = payload?;
            match serde_json::from_slice::<NutritionCacheEntry>(&bytes) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(entry_id = %id, error = %e, "Skipping corrupt nutrition cache entry");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::{NutritionInfo, NutritionSource};

    fn stored(name: &str) -> (String, Option<Vec<u8>>) {
        let entry = NutritionCacheEntry::new(
            name,
            BTreeSet::from([name.to_owned()]),
            &NutritionInfo::zero(100.0),
            NutritionSource::Authoritative,
        );
        let bytes = serde_json::to_vec(&entry).ok();
        (entry.id.to_string(), bytes)
    }

    #[test]
    fn test_corrupt_and_expired_payloads_are_skipped() {
        let (apple_id, apple) = stored("apple");
        let (rice_id, rice) = stored("rice");
        let broken_id = Uuid::new_v4().to_string();
        let expired_id = Uuid::new_v4().to_string();

        let rows = vec![
            (apple_id.as_str(), apple),
            (broken_id.as_str(), Some(b"{not json".to_vec())),
            (expired_id.as_str(), None),
            (rice_id.as_str(), rice),
        ];
        let names: Vec<String> = decode_entries(rows)
            .into_iter()
            .map(|entry| entry.food_name)
            .collect();
        assert_eq!(names, vec!["apple", "rice"]);
    }

    #[test]
    fn test_index_keys_share_the_namespace() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(
            RedisNutritionCache::entry_key(&id),
            format!("mealscan:nutrition:entry:{id}")
        );
        assert_eq!(
            RedisNutritionCache::keyword_key("rice"),
            "mealscan:nutrition:kw:rice"
        );
        assert_eq!(index_depth(NAME_INDEX_DEPTH), 16);
    }
}
