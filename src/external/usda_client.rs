// ABOUTME: USDA FoodData Central client backing the database tier of nutrition resolution
// ABOUTME: Searches foods, fetches per-100 g nutrient rows, caches responses, and budgets requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! USDA `FoodData` Central client
//!
//! A lookup is two calls: `/foods/search` for candidate records, then
//! `/food/{fdcId}` for the nutrient rows of the most authoritative hit.
//! Both responses are kept in a bounded TTL cache, and a sliding one-minute
//! budget turns bursts into `ExternalRateLimited` errors instead of queuing.
//!
//! API guide: <https://fdc.nal.usda.gov/api-guide.html>
//!
//! ```rust,no_run
//! use mealscan::external::{UsdaClient, UsdaClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UsdaClient::new(UsdaClientConfig::from_env());
//! let hits = client.search("apple", 5).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::env_or;
use crate::constants::resolver::DATABASE_SEARCH_PAGE_SIZE;
use crate::constants::usda::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_TTL_SECS, DEFAULT_RATE_LIMIT_PER_MINUTE, MINERALS,
    NUTRIENT_CARBS, NUTRIENT_ENERGY, NUTRIENT_FAT, NUTRIENT_FIBER, NUTRIENT_PROTEIN,
    NUTRIENT_SODIUM, NUTRIENT_SUGAR, VITAMINS,
};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::NutritionInfo;
use crate::nutrition::NutritionDatabase;

const SERVICE: &str = "USDA API";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_PAGE_SIZE: u32 = 200;
const SEARCH_CACHE_CAPACITY: usize = 512;
const FOOD_CACHE_CAPACITY: usize = 1024;

/// Connection settings for `FoodData` Central
#[derive(Debug, Clone)]
pub struct UsdaClientConfig {
    /// Data.gov API key; the tier is skipped when empty
    pub api_key: String,
    /// API root without trailing slash
    pub base_url: String,
    /// How long cached responses stay valid
    pub cache_ttl_secs: u64,
    /// Outbound requests allowed per rolling minute
    pub rate_limit_per_minute: u32,
}

impl Default for UsdaClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
        }
    }
}

impl UsdaClientConfig {
    /// Read `USDA_API_KEY`, `USDA_BASE_URL`, `USDA_CACHE_TTL_SECS` and
    /// `USDA_RATE_LIMIT_PER_MINUTE`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: env_or("USDA_API_KEY", String::new()),
            base_url: env_or("USDA_BASE_URL", DEFAULT_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            cache_ttl_secs: env_or("USDA_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            rate_limit_per_minute: env_or(
                "USDA_RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            )
            .max(1),
        }
    }

    /// Whether an API key is present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// One hit from `/foods/search`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSummary {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Record description, e.g. "Apples, raw, with skin"
    pub description: String,
    /// Source dataset such as "Foundation" or "Branded"
    #[serde(default)]
    pub data_type: String,
    /// Manufacturer for branded records
    #[serde(default)]
    pub brand_owner: Option<String>,
}

impl FoodSummary {
    /// Lower is more authoritative
    fn dataset_rank(&self) -> u8 {
        match self.data_type.as_str() {
            "Foundation" => 0,
            "SR Legacy" => 1,
            "Survey (FNDDS)" => 2,
            "Branded" => 4,
            _ => 3,
        }
    }
}

/// Nutrient amount per 100 g
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodNutrient {
    /// FDC nutrient number
    pub id: u32,
    /// Amount in the nutrient's native unit
    pub amount: f64,
}

/// A food record with its nutrient rows
#[derive(Debug, Clone)]
pub struct FoodRecord {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Record description
    pub description: String,
    /// Source dataset
    pub data_type: String,
    /// Reported nutrients
    pub nutrients: Vec<FoodNutrient>,
}

impl FoodRecord {
    fn amount(&self, id: u32) -> f64 {
        self.nutrients
            .iter()
            .find(|n| n.id == id)
            .map_or(0.0, |n| n.amount)
    }

    /// Nutrition for a 100 g portion
    ///
    /// FDC amounts are already per 100 g whatever the listed serving.
    #[must_use]
    pub fn nutrition_per_100g(&self) -> NutritionInfo {
        let mut info = NutritionInfo::zero(100.0);
        info.calories = self.amount(NUTRIENT_ENERGY);
        info.protein = self.amount(NUTRIENT_PROTEIN);
        info.carbs = self.amount(NUTRIENT_CARBS);
        info.fat = self.amount(NUTRIENT_FAT);
        info.fiber = self.amount(NUTRIENT_FIBER);
        info.sugar = self.amount(NUTRIENT_SUGAR);
        info.sodium = self.amount(NUTRIENT_SODIUM);

        for &FoodNutrient { id, amount } in &self.nutrients {
            let named = |table: &[(u32, &'static str)]| {
                table.iter().find(|(key, _)| *key == id).map(|(_, name)| *name)
            };
            if let Some(name) = named(VITAMINS) {
                info.vitamins.insert(name.to_owned(), amount);
            } else if let Some(name) = named(MINERALS) {
                info.minerals.insert(name.to_owned(), amount);
            }
        }
        info.sanitized()
    }
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    foods: Vec<FoodSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFood {
    fdc_id: u64,
    description: String,
    #[serde(default)]
    data_type: String,
    #[serde(default)]
    food_nutrients: Vec<WireNutrientRow>,
}

#[derive(Deserialize)]
struct WireNutrientRow {
    nutrient: Option<WireNutrient>,
    amount: Option<f64>,
}

#[derive(Deserialize)]
struct WireNutrient {
    id: u32,
}

impl From<WireFood> for FoodRecord {
    fn from(wire: WireFood) -> Self {
        Self {
            fdc_id: wire.fdc_id,
            description: wire.description,
            data_type: wire.data_type,
            nutrients: wire
                .food_nutrients
                .into_iter()
                .filter_map(|row| {
                    Some(FoodNutrient {
                        id: row.nutrient?.id,
                        amount: row.amount.unwrap_or(0.0),
                    })
                })
                .collect(),
        }
    }
}

/// Bounded response cache whose entries expire after a fixed TTL
struct TtlCache<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, (Instant, V)>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let expired = entries
            .peek(key)
            .is_some_and(|(stored, _)| stored.elapsed() >= self.ttl);
        if expired {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|(_, value)| value.clone())
    }

    async fn put(&self, key: K, value: V) {
        self.entries.lock().await.put(key, (Instant::now(), value));
    }
}

/// Sliding-window request budget
#[derive(Debug)]
struct RequestBudget {
    sent: VecDeque<Instant>,
    per_window: usize,
    window: Duration,
}

impl RequestBudget {
    fn per_minute(limit: u32) -> Self {
        let per_window = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
        Self {
            sent: VecDeque::with_capacity(per_window),
            per_window,
            window: Duration::from_secs(60),
        }
    }

    /// Claim a slot at `now` or fail without waiting
    fn take(&mut self, now: Instant) -> AppResult<()> {
        while self
            .sent
            .front()
            .is_some_and(|sent| now.duration_since(*sent) >= self.window)
        {
            self.sent.pop_front();
        }
        if self.sent.len() >= self.per_window {
            return Err(AppError::new(
                ErrorCode::ExternalRateLimited,
                format!("{SERVICE}: {} requests per minute used", self.per_window),
            ));
        }
        self.sent.push_back(now);
        Ok(())
    }
}

fn status_error(status: StatusCode, body: &str) -> AppError {
    match status.as_u16() {
        401 | 403 => AppError::new(
            ErrorCode::ExternalAuthFailed,
            format!("{SERVICE} rejected the API key"),
        ),
        404 => AppError::not_found(format!("{SERVICE} record")),
        429 => AppError::new(
            ErrorCode::ExternalRateLimited,
            format!("{SERVICE} quota exceeded"),
        ),
        _ => {
            let excerpt: String = body.chars().take(200).collect();
            AppError::external_service(SERVICE, format!("HTTP {status}: {excerpt}"))
        }
    }
}

/// Pick the most authoritative hit, keeping relevance order among equals
fn best_match(hits: &[FoodSummary]) -> Option<&FoodSummary> {
    hits.iter().min_by_key(|hit| hit.dataset_rank())
}

/// Live `FoodData` Central client
pub struct UsdaClient {
    config: UsdaClientConfig,
    http: reqwest::Client,
    searches: TtlCache<String, Vec<FoodSummary>>,
    foods: TtlCache<u64, FoodRecord>,
    budget: Mutex<RequestBudget>,
}

impl UsdaClient {
    /// Client for `config`
    #[must_use]
    pub fn new(config: UsdaClientConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            budget: Mutex::new(RequestBudget::per_minute(config.rate_limit_per_minute)),
            searches: TtlCache::new(SEARCH_CACHE_CAPACITY, ttl),
            foods: TtlCache::new(FOOD_CACHE_CAPACITY, ttl),
            http,
            config,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        self.budget.lock().await.take(Instant::now())?;

        let response = self
            .http
            .get(format!("{}{path}", self.config.base_url))
            .query(&[("api_key", self.config.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::external_timeout(SERVICE, REQUEST_TIMEOUT_SECS)
                } else {
                    AppError::external_unavailable(SERVICE, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, path, "USDA request failed");
            return Err(status_error(status, &body));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("unparseable body: {e}")))
    }

    /// Search foods matching `query`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank query or a page size outside
    /// 1..=200, `ExternalRateLimited` when the budget is spent, and
    /// external-service errors from the API.
    pub async fn search(&self, query: &str, page_size: u32) -> AppResult<Vec<FoodSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_input("USDA search query is empty"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::invalid_input(format!(
                "USDA page size must be 1..={MAX_PAGE_SIZE}"
            )));
        }

        let key = format!("{}:{page_size}", query.to_lowercase());
        if let Some(hits) = self.searches.get(&key).await {
            return Ok(hits);
        }
        let page: SearchPage = self
            .get_json(
                "/foods/search",
                &[("query", query), ("pageSize", &page_size.to_string())],
            )
            .await?;
        self.searches.put(key, page.foods.clone()).await;
        Ok(page.foods)
    }

    /// Fetch one food record with its nutrients
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID and the same transport errors as
    /// [`Self::search`].
    pub async fn food(&self, fdc_id: u64) -> AppResult<FoodRecord> {
        if let Some(record) = self.foods.get(&fdc_id).await {
            return Ok(record);
        }
        let record = FoodRecord::from(
            self.get_json::<WireFood>(&format!("/food/{fdc_id}"), &[])
                .await?,
        );
        self.foods.put(fdc_id, record.clone()).await;
        Ok(record)
    }
}

#[async_trait]
impl NutritionDatabase for UsdaClient {
    fn name(&self) -> &'static str {
        "usda"
    }

    #[instrument(skip(self), fields(food = %food_name))]
    async fn lookup_per_100g(&self, food_name: &str) -> AppResult<Option<NutritionInfo>> {
        let hits = self.search(food_name, DATABASE_SEARCH_PAGE_SIZE).await?;
        let Some(hit) = best_match(&hits) else {
            debug!("no USDA record");
            return Ok(None);
        };
        debug!(fdc_id = hit.fdc_id, description = %hit.description, "USDA record chosen");
        Ok(Some(self.food(hit.fdc_id).await?.nutrition_per_100g()))
    }
}

impl std::fmt::Debug for UsdaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsdaClient")
            .field("base_url", &self.config.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

type MockRow = (u64, &'static str, &'static [(u32, f64)]);

const MOCK_FOODS: &[MockRow] = &[
    (
        171_477,
        "Chicken, breast, meat only, cooked, roasted",
        &[
            (NUTRIENT_ENERGY, 165.0),
            (NUTRIENT_PROTEIN, 31.02),
            (NUTRIENT_FAT, 3.57),
            (NUTRIENT_CARBS, 0.0),
            (NUTRIENT_SODIUM, 74.0),
            (1089, 1.04),
        ],
    ),
    (
        171_688,
        "Apples, raw, with skin",
        &[
            (NUTRIENT_ENERGY, 52.0),
            (NUTRIENT_PROTEIN, 0.26),
            (NUTRIENT_FAT, 0.17),
            (NUTRIENT_CARBS, 13.81),
            (NUTRIENT_FIBER, 2.4),
            (NUTRIENT_SUGAR, 10.39),
            (1162, 4.6),
        ],
    ),
    (
        169_756,
        "Rice, white, long-grain, regular, cooked",
        &[
            (NUTRIENT_ENERGY, 130.0),
            (NUTRIENT_PROTEIN, 2.69),
            (NUTRIENT_FAT, 0.28),
            (NUTRIENT_CARBS, 28.17),
            (NUTRIENT_FIBER, 0.4),
        ],
    ),
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Offline stand-in with chicken breast, apple and white rice
pub struct MockUsdaClient {
    records: Vec<FoodRecord>,
    lookups: AtomicUsize,
}

impl MockUsdaClient {
    /// Mock preloaded with its fixed records
    #[must_use]
    pub fn new() -> Self {
        let records = MOCK_FOODS
            .iter()
            .map(|&(fdc_id, description, rows)| FoodRecord {
                fdc_id,
                description: description.to_owned(),
                data_type: "SR Legacy".to_owned(),
                nutrients: rows
                    .iter()
                    .map(|&(id, amount)| FoodNutrient { id, amount })
                    .collect(),
            })
            .collect();
        Self {
            records,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Records where every query word prefixes some description word
    fn matching(&self, query: &str) -> Vec<&FoodRecord> {
        let wanted = words(query);
        if wanted.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|record| {
                let have = words(&record.description);
                wanted
                    .iter()
                    .all(|w| have.iter().any(|h| h.starts_with(w.as_str())))
            })
            .collect()
    }

    /// Number of `lookup_per_100g` calls served so far
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for MockUsdaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NutritionDatabase for MockUsdaClient {
    fn name(&self) -> &'static str {
        "usda-mock"
    }

    async fn lookup_per_100g(&self, food_name: &str) -> AppResult<Option<NutritionInfo>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .matching(food_name)
            .first()
            .map(|record| record.nutrition_per_100g()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(fdc_id: u64, data_type: &str) -> FoodSummary {
        FoodSummary {
            fdc_id,
            description: format!("food {fdc_id}"),
            data_type: data_type.to_owned(),
            brand_owner: None,
        }
    }

    #[test]
    fn test_budget_refuses_past_limit_then_recovers() {
        let mut budget = RequestBudget::per_minute(2);
        let start = Instant::now();
        assert!(budget.take(start).is_ok());
        assert!(budget.take(start).is_ok());
        let err = budget.take(start).unwrap_err();
        assert_eq!(err.code, ErrorCode::ExternalRateLimited);
        assert!(budget.take(start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_best_match_prefers_reference_data() {
        let hits = vec![hit(1, "Branded"), hit(2, "SR Legacy"), hit(3, "Foundation")];
        assert_eq!(best_match(&hits).map(|h| h.fdc_id), Some(3));

        let ties = vec![hit(7, "SR Legacy"), hit(8, "SR Legacy")];
        assert_eq!(best_match(&ties).map(|h| h.fdc_id), Some(7));
    }

    #[test]
    fn test_wire_food_maps_nutrients_per_100g() {
        let body = r#"{
            "fdcId": 171688,
            "description": "Apples, raw, with skin",
            "dataType": "SR Legacy",
            "foodNutrients": [
                {"nutrient": {"id": 1008, "name": "Energy", "unitName": "kcal"}, "amount": 52.0},
                {"nutrient": {"id": 1162, "name": "Vitamin C", "unitName": "mg"}, "amount": 4.6},
                {"nutrient": {"id": 1087, "name": "Calcium, Ca", "unitName": "mg"}},
                {"amount": 3.0}
            ]
        }"#;
        let record = FoodRecord::from(serde_json::from_str::<WireFood>(body).unwrap());
        assert_eq!(record.nutrients.len(), 3);

        let info = record.nutrition_per_100g();
        assert!((info.calories - 52.0).abs() < f64::EPSILON);
        let vitamin_c = info.vitamins.get("vitamin_c_mg").copied().unwrap_or_default();
        assert!((vitamin_c - 4.6).abs() < f64::EPSILON);
        assert!(info.minerals.contains_key("calcium_mg"));
    }

    #[test]
    fn test_status_error_classification() {
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, "").code,
            ErrorCode::ExternalAuthFailed
        );
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "").code,
            ErrorCode::ExternalRateLimited
        );
        assert!(status_error(StatusCode::BAD_GATEWAY, "upstream").is_transient());
    }

    #[tokio::test]
    async fn test_ttl_cache_expires_entries() {
        let cache = TtlCache::new(4, Duration::ZERO);
        cache.put("apple".to_owned(), 1).await;
        assert_eq!(cache.get(&"apple".to_owned()).await, None);

        let cache = TtlCache::new(4, Duration::from_secs(60));
        cache.put("apple".to_owned(), 1).await;
        assert_eq!(cache.get(&"apple".to_owned()).await, Some(1));
    }

    #[tokio::test]
    async fn test_mock_matches_word_prefixes() {
        let mock = MockUsdaClient::new();
        assert!(mock.lookup_per_100g("chicken breast").await.unwrap().is_some());
        assert!(mock.lookup_per_100g("pizza").await.unwrap().is_none());
        assert!(mock.lookup_per_100g("  ").await.unwrap().is_none());
        assert_eq!(mock.lookup_count(), 3);
    }
}
