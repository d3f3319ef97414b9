use chrono::Utc;
use tracing::{debug, warn};

use crate::api;
use crate::config::{Feed, Watch};
use crate::state::{resolve, CatalogCache, RetentionCache};
use crate::trade::{Trade, TradeTier};

/// A trade that just entered the retention cache, ready for notification.
#[derive(Debug, Clone)]
pub struct AdmittedTrade {
    pub trade: Trade,
    /// Resolved outcome label, or one of the sentinels from `state::outcome`
    pub outcome: String,
    pub tier: TradeTier,
    pub value: rust_decimal::Decimal,
}

/// Owns both caches and runs one fetch cycle at a time.
///
/// Network I/O happens up front; every cache mutation for a cycle then lands
/// in the synchronous [`apply_batch`](Self::apply_batch), so a cycle can
/// never observe another cycle's half-applied state.
pub struct Pipeline {
    pub history: RetentionCache,
    pub catalog: CatalogCache,
}

impl Pipeline {
    pub fn new(history: RetentionCache, catalog: CatalogCache) -> Self {
        Self { history, catalog }
    }

    /// Run one full cycle: fetch, refresh the catalog if stale, then apply.
    ///
    /// A feed failure skips the cycle entirely (state untouched, retried on
    /// the next tick). A catalog failure only means outcomes resolve against
    /// the stale catalog this cycle.
    pub async fn run_cycle(
        &mut self,
        client: &reqwest::Client,
        feed: &Feed,
        watch: &Watch,
    ) -> Vec<AdmittedTrade> {
        let fetched = api::data::fetch_trades(client, feed.fetch_limit).await;
        let now_ms = Utc::now().timestamp_millis();

        // At most one catalog refresh per batch, only when stale, and not
        // on a dead cycle.
        if fetched.is_ok() {
            self.catalog.set_ttl(watch.catalog_ttl_ms);
            if !self.catalog.is_fresh(now_ms) {
                match api::gamma::fetch_catalog(client).await {
                    Ok(markets) => self.catalog.replace(markets, now_ms),
                    Err(e) => {
                        warn!(error = %e, "catalog refresh failed; resolving against stale catalog")
                    }
                }
            }
        }

        self.apply_fetch_result(fetched, now_ms, watch)
    }

    /// Route a fetch result into the mutation step. A failed fetch skips
    /// the cycle entirely: nothing admitted, nothing evicted, nothing
    /// persisted; the next tick retries against unchanged caches.
    pub fn apply_fetch_result(
        &mut self,
        fetched: Result<Vec<Trade>, api::FeedError>,
        now_ms: i64,
        watch: &Watch,
    ) -> Vec<AdmittedTrade> {
        match fetched {
            Ok(trades) => self.apply_batch(trades, now_ms, watch),
            Err(e) => {
                warn!(error = %e, "trade fetch failed; skipping cycle");
                Vec::new()
            }
        }
    }

    /// The synchronous mutation step: threshold filter, dedup, eviction,
    /// persistence, classification.
    ///
    /// Eviction runs after insertion on purpose: a trade admitted this cycle
    /// has age zero and must not be evicted and re-admitted as new.
    pub fn apply_batch(
        &mut self,
        trades: Vec<Trade>,
        now_ms: i64,
        watch: &Watch,
    ) -> Vec<AdmittedTrade> {
        self.history.set_ttl(watch.retention_ttl_ms);

        let total = trades.len();
        let mut admitted = Vec::new();
        for trade in trades {
            if trade.qualifying_value(watch.value_mode) < watch.min_value {
                continue;
            }
            if self.history.insert_if_absent(&trade, now_ms) {
                admitted.push(trade);
            }
        }

        self.history.evict_expired(now_ms);
        self.history.persist_if_dirty();
        self.catalog.persist_if_dirty();

        debug!(
            fetched = total,
            admitted = admitted.len(),
            retained = self.history.len(),
            "cycle applied"
        );

        admitted
            .into_iter()
            .map(|trade| {
                let value = trade.qualifying_value(watch.value_mode);
                let outcome = resolve(&trade, &self.catalog).to_string();
                AdmittedTrade {
                    outcome,
                    tier: TradeTier::classify(value, watch.whale_value),
                    value,
                    trade,
                }
            })
            .collect()
    }

    /// Retained history for rendering, newest event first.
    pub fn snapshot(&self) -> Vec<Trade> {
        self.history.snapshot()
    }
}
