use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::Storage;
use crate::trade::Trade;

/// Key the history blob is persisted under.
pub const STORAGE_KEY: &str = "polymarket_large_trades";

/// A retained trade plus the wall-clock instant we first saw it. The trade's
/// own `timestamp` is when it happened on-chain; `firstSeen` is when it
/// entered this cache, and is what the retention TTL counts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub trade: Trade,
    #[serde(rename = "firstSeen")]
    pub first_seen_ms: i64,
}

/// Deduplicated, time-bounded record of large trades.
///
/// Keys are trade fingerprints; entries live for the retention TTL measured
/// from first sight, surviving process restarts via the injected [`Storage`].
/// All persistence failures degrade to in-memory-only operation.
pub struct RetentionCache {
    entries: HashMap<String, CacheEntry>,
    ttl_ms: i64,
    dirty: bool,
    storage: Box<dyn Storage>,
}

impl RetentionCache {
    /// Load persisted history. Missing or corrupt state yields an empty
    /// cache; this never fails.
    pub fn load(storage: Box<dyn Storage>, ttl_ms: i64) -> Self {
        let entries = match storage.get(STORAGE_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "discarding unreadable trade history");
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };
        debug!(entries = entries.len(), "trade history loaded");
        Self {
            entries,
            ttl_ms,
            dirty: false,
            storage,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retention window is a live setting; shrinking it takes effect on the
    /// next eviction pass.
    pub fn set_ttl(&mut self, ttl_ms: i64) {
        self.ttl_ms = ttl_ms;
    }

    /// Admit a trade unless its fingerprint is already present.
    ///
    /// Returns true when the trade is new. Duplicates cause no mutation at
    /// all, so the original `firstSeen` always stands.
    pub fn insert_if_absent(&mut self, trade: &Trade, now_ms: i64) -> bool {
        let key = trade.fingerprint();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            CacheEntry {
                trade: trade.clone(),
                first_seen_ms: now_ms,
            },
        );
        self.dirty = true;
        true
    }

    /// Remove every entry older than the TTL. Returns whether anything was
    /// removed. Call once per cycle and once at startup, so a long-idle
    /// process doesn't show stale history.
    pub fn evict_expired(&mut self, now_ms: i64) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now_ms - e.first_seen_ms <= self.ttl_ms);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "expired trades dropped from history");
            self.dirty = true;
        }
        evicted > 0
    }

    /// Write the store out if membership changed since the last write.
    /// Bounds write volume under high trade throughput.
    pub fn persist_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        match serde_json::to_string(&self.entries) {
            Ok(raw) => {
                self.storage.set(STORAGE_KEY, &raw);
                self.dirty = false;
            }
            Err(e) => warn!(error = %e, "trade history serialization failed"),
        }
    }

    /// All retained trades, newest event first. Ties on timestamp break by
    /// fingerprint so repeated renders are byte-for-byte identical.
    pub fn snapshot(&self) -> Vec<Trade> {
        let mut keyed: Vec<(&String, &CacheEntry)> = self.entries.iter().collect();
        keyed.sort_by(|(ka, a), (kb, b)| {
            b.trade
                .timestamp
                .cmp(&a.trade.timestamp)
                .then_with(|| ka.cmp(kb))
        });
        keyed.into_iter().map(|(_, e)| e.trade.clone()).collect()
    }
}
