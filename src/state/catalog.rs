use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::Storage;

/// Key the catalog blob is persisted under. Independent of the trade
/// history blob; the two expire on their own clocks.
pub const STORAGE_KEY: &str = "polymarket_market_catalog";

/// What we keep per market: the question text and the outcome labels in
/// API order (the order is what `outcomeIndex` indexes into).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCatalogEntry {
    pub question: String,
    pub outcomes: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedCatalog {
    #[serde(rename = "fetchedAt")]
    fetched_at_ms: Option<i64>,
    markets: HashMap<String, MarketCatalogEntry>,
}

/// Snapshot of the market catalog, refreshed as one atomic unit.
///
/// Freshness is cache-wide: a single fetch timestamp covers the whole
/// mapping, and [`replace`](Self::replace) swaps mapping and timestamp
/// together so readers never see a mixed old/new catalog.
pub struct CatalogCache {
    markets: HashMap<String, MarketCatalogEntry>,
    fetched_at_ms: Option<i64>,
    ttl_ms: i64,
    dirty: bool,
    storage: Box<dyn Storage>,
}

impl CatalogCache {
    /// Load the persisted catalog; missing or corrupt state yields an empty,
    /// stale cache that the next cycle will refresh.
    pub fn load(storage: Box<dyn Storage>, ttl_ms: i64) -> Self {
        let persisted = match storage.get(STORAGE_KEY) {
            Some(raw) => match serde_json::from_str::<PersistedCatalog>(&raw) {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "discarding unreadable market catalog");
                    PersistedCatalog::default()
                }
            },
            None => PersistedCatalog::default(),
        };
        debug!(markets = persisted.markets.len(), "market catalog loaded");
        Self {
            markets: persisted.markets,
            fetched_at_ms: persisted.fetched_at_ms,
            ttl_ms,
            dirty: false,
            storage,
        }
    }

    /// True iff a fetch has happened and its age is within the TTL.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        match self.fetched_at_ms {
            Some(at) => now_ms - at <= self.ttl_ms,
            None => false,
        }
    }

    pub fn set_ttl(&mut self, ttl_ms: i64) {
        self.ttl_ms = ttl_ms;
    }

    /// Swap in a freshly fetched catalog. Whole-cache replacement: no
    /// per-entry merging, so an interrupted fetch that never reaches this
    /// point leaves the previous catalog fully intact.
    pub fn replace(&mut self, markets: HashMap<String, MarketCatalogEntry>, now_ms: i64) {
        debug!(markets = markets.len(), "market catalog refreshed");
        self.markets = markets;
        self.fetched_at_ms = Some(now_ms);
        self.dirty = true;
    }

    pub fn get(&self, condition_id: &str) -> Option<&MarketCatalogEntry> {
        self.markets.get(condition_id)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn persist_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        let blob = PersistedCatalog {
            fetched_at_ms: self.fetched_at_ms,
            markets: self.markets.clone(),
        };
        match serde_json::to_string(&blob) {
            Ok(raw) => {
                self.storage.set(STORAGE_KEY, &raw);
                self.dirty = false;
            }
            Err(e) => warn!(error = %e, "market catalog serialization failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    const TTL: i64 = 600_000;

    fn entry(question: &str, outcomes: &[&str]) -> MarketCatalogEntry {
        MarketCatalogEntry {
            question: question.to_string(),
            outcomes: outcomes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_never_fetched_is_stale() {
        let cache = CatalogCache::load(Box::new(MemoryStorage::new()), TTL);
        assert!(!cache.is_fresh(0));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_freshness_window() {
        let mut cache = CatalogCache::load(Box::new(MemoryStorage::new()), TTL);
        cache.replace(HashMap::new(), 1_000);

        assert!(cache.is_fresh(1_000));
        assert!(cache.is_fresh(1_000 + TTL));
        assert!(!cache.is_fresh(1_000 + TTL + 1));
    }

    #[test]
    fn test_replace_is_whole_catalog() {
        let mut cache = CatalogCache::load(Box::new(MemoryStorage::new()), TTL);
        let mut first = HashMap::new();
        first.insert("0xaaa".to_string(), entry("Old?", &["Yes", "No"]));
        cache.replace(first, 0);

        let mut second = HashMap::new();
        second.insert("0xbbb".to_string(), entry("New?", &["Yes", "No"]));
        cache.replace(second, 1);

        // The old key is gone, not merged
        assert!(cache.get("0xaaa").is_none());
        assert_eq!(cache.get("0xbbb").unwrap().question, "New?");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_persist_and_reload() {
        let storage = MemoryStorage::new();
        let mut cache = CatalogCache::load(Box::new(storage.clone()), TTL);
        let mut markets = HashMap::new();
        markets.insert("0xaaa".to_string(), entry("Will it rain?", &["Yes", "No"]));
        cache.replace(markets, 42);
        cache.persist_if_dirty();

        let reloaded = CatalogCache::load(Box::new(storage), TTL);
        assert!(reloaded.is_fresh(42));
        assert_eq!(reloaded.get("0xaaa").unwrap().outcomes, vec!["Yes", "No"]);
    }

    #[test]
    fn test_corrupt_state_loads_empty() {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "\"half a blob");
        let cache = CatalogCache::load(Box::new(storage), TTL);
        assert!(cache.is_empty());
        assert!(!cache.is_fresh(0));
    }
}
