use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::events::Side;

/// One fill from the public data API.
///
/// Only the fields the watcher consumes are modeled; the rest of the payload
/// is ignored. `size` and `price` sometimes arrive as JSON strings, which
/// `Decimal`'s deserializer accepts alongside plain numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "conditionId")]
    pub condition_id: String,

    /// Event time in seconds since epoch
    pub timestamp: i64,

    /// Shares traded
    pub size: Decimal,

    pub price: Decimal,

    pub side: Side,

    /// Index into the market's outcome list, when the API includes it
    #[serde(rename = "outcomeIndex", default, skip_serializing_if = "Option::is_none")]
    pub outcome_index: Option<usize>,

    // Display metadata. All optional; absence never disqualifies a trade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(rename = "eventSlug", default, skip_serializing_if = "Option::is_none")]
    pub event_slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Counterparty display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "transactionHash", default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

impl Trade {
    /// Stable identity for deduplication: the immutable fields joined with
    /// `-`. Two polls that return the same fill produce the same key, so the
    /// retention cache sees it once.
    ///
    /// None of the joined fields can contain `-` (hex id, integers, decimal
    /// strings, BUY/SELL).
    pub fn fingerprint(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.condition_id,
            self.timestamp,
            self.size,
            self.price,
            self.side.as_str()
        )
    }

    /// The number a trade is judged by: share count, or notional dollars
    /// paid, depending on config.
    pub fn qualifying_value(&self, mode: ValueMode) -> Decimal {
        match mode {
            ValueMode::Size => self.size,
            ValueMode::Notional => self.size * self.price,
        }
    }

    /// Link to the event page, when the feed gave us a slug.
    pub fn event_url(&self) -> Option<String> {
        self.event_slug
            .as_deref()
            .map(|s| format!("https://polymarket.com/event/{}", s))
    }
}

/// Which number a trade's value is measured by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Raw share count (the original watcher's behavior)
    #[default]
    Size,
    /// size × price, i.e. dollars actually paid
    Notional,
}

/// Severity of an admitted trade. `Whale` crosses the second, higher
/// threshold and is what notifiers escalate (sound, highlight).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeTier {
    Large,
    Whale,
}

impl TradeTier {
    pub fn classify(value: Decimal, whale_value: Decimal) -> Self {
        if value >= whale_value {
            TradeTier::Whale
        } else {
            TradeTier::Large
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TradeTier::Large => "LARGE",
            TradeTier::Whale => "WHALE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample() -> Trade {
        Trade {
            condition_id: "0xabc".to_string(),
            timestamp: 1_700_000_000,
            size: dec!(12500),
            price: dec!(0.45),
            side: Side::Buy,
            outcome_index: None,
            slug: None,
            event_slug: None,
            title: None,
            icon: None,
            name: None,
            transaction_hash: None,
        }
    }

    #[test]
    fn test_fingerprint_format() {
        let t = sample();
        assert_eq!(t.fingerprint(), "0xabc-1700000000-12500-0.45-BUY");
    }

    #[test]
    fn test_fingerprint_distinguishes_side() {
        let buy = sample();
        let mut sell = sample();
        sell.side = Side::Sell;
        assert_ne!(buy.fingerprint(), sell.fingerprint());
    }

    #[test]
    fn test_qualifying_value_modes() {
        let t = sample();
        assert_eq!(t.qualifying_value(ValueMode::Size), dec!(12500));
        assert_eq!(t.qualifying_value(ValueMode::Notional), dec!(5625.00));
    }

    #[test]
    fn test_tier_classify() {
        assert_eq!(TradeTier::classify(dec!(12000), dec!(50000)), TradeTier::Large);
        assert_eq!(TradeTier::classify(dec!(50000), dec!(50000)), TradeTier::Whale);
        assert_eq!(TradeTier::classify(dec!(90000), dec!(50000)), TradeTier::Whale);
    }

    #[test]
    fn test_deserialize_size_as_string() {
        // The data API is inconsistent about numeric encoding
        let t: Trade = serde_json::from_value(json!({
            "conditionId": "0xabc",
            "timestamp": 1_700_000_000,
            "size": "12500.5",
            "price": 0.45,
            "side": "SELL"
        }))
        .unwrap();
        assert_eq!(t.size, dec!(12500.5));
        assert_eq!(t.side, Side::Sell);
        assert_eq!(t.outcome_index, None);
    }

    #[test]
    fn test_deserialize_full_record() {
        let t: Trade = serde_json::from_value(json!({
            "conditionId": "0xabc",
            "timestamp": 1_700_000_000,
            "size": 20000,
            "price": "0.62",
            "side": "BUY",
            "outcomeIndex": 1,
            "slug": "will-it-rain",
            "eventSlug": "weather-week",
            "name": "whale.eth",
            "transactionHash": "0xdeadbeef"
        }))
        .unwrap();
        assert_eq!(t.outcome_index, Some(1));
        assert_eq!(
            t.event_url().as_deref(),
            Some("https://polymarket.com/event/weather-week")
        );
    }

    #[test]
    fn test_deserialize_missing_required_field_fails() {
        // No timestamp: the record is malformed and must be rejected
        let result: Result<Trade, _> = serde_json::from_value(json!({
            "conditionId": "0xabc",
            "size": 20000,
            "price": 0.62,
            "side": "BUY"
        }));
        assert!(result.is_err());
    }
}
