use crate::events::Side;
use crate::state::CatalogCache;
use crate::trade::Trade;

/// Returned when the trade's market is not in the catalog, or has no
/// outcome labels at all.
pub const UNKNOWN_OUTCOME: &str = "Unknown outcome";

/// Returned for markets with more than two outcomes when the trade carries
/// no usable outcome index. We don't guess among three or more labels.
pub const MULTIPLE_OUTCOMES: &str = "Multiple outcomes";

/// Map a trade to its outcome label. First matching rule wins:
///
/// 1. market unknown or has zero outcomes -> [`UNKNOWN_OUTCOME`]
/// 2. trade carries an in-bounds `outcomeIndex` -> that label (authoritative)
/// 3. exactly two outcomes -> first label on BUY, second otherwise.
///    Heuristic only: the taker side is not confirmed to map to outcome
///    order for all market types.
/// 4. otherwise -> [`MULTIPLE_OUTCOMES`]
///
/// Rule 2 always beats rule 3: explicit index data wins over the side
/// heuristic.
pub fn resolve<'a>(trade: &Trade, catalog: &'a CatalogCache) -> &'a str {
    let Some(market) = catalog.get(&trade.condition_id) else {
        return UNKNOWN_OUTCOME;
    };
    if market.outcomes.is_empty() {
        return UNKNOWN_OUTCOME;
    }

    if let Some(idx) = trade.outcome_index {
        if let Some(label) = market.outcomes.get(idx) {
            return label;
        }
    }

    if market.outcomes.len() == 2 {
        return match trade.side {
            Side::Buy => &market.outcomes[0],
            Side::Sell => &market.outcomes[1],
        };
    }

    MULTIPLE_OUTCOMES
}
