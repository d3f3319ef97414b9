use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::api::FeedError;
use crate::state::MarketCatalogEntry;

const GAMMA_BASE: &str = "https://gamma-api.polymarket.com";

/// Rows per page when walking the markets listing.
const PAGE_SIZE: u32 = 500;

/// Safety cap on pagination; beyond this the tail markets are too small to
/// ever show up in the large-trade feed.
const MAX_PAGES: u32 = 8;

/// Market row from the Gamma API. `outcomes` sometimes arrives as a JSON
/// array encoded inside a string (e.g. `"[\"Yes\",\"No\"]"`), hence the
/// custom deserializer.
#[derive(Debug, Deserialize)]
struct GammaMarket {
    #[serde(rename = "conditionId")]
    condition_id: String,

    #[serde(default)]
    question: Option<String>,

    #[serde(default, deserialize_with = "de_outcomes")]
    outcomes: Vec<String>,
}

fn de_outcomes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        Value::String(s) => Ok(serde_json::from_str(&s).unwrap_or_default()),
        _ => Ok(Vec::new()),
    }
}

/// Fetch the open-market catalog, keyed by condition id.
///
/// Pages through `/markets?closed=false` and returns the full mapping in
/// one piece; the caller swaps it into the catalog cache atomically.
pub async fn fetch_catalog(
    client: &reqwest::Client,
) -> Result<HashMap<String, MarketCatalogEntry>, FeedError> {
    let mut catalog = HashMap::new();

    for page in 0..MAX_PAGES {
        let response = client
            .get(format!("{}/markets", GAMMA_BASE))
            .query(&[
                ("closed", "false".to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("offset", (page * PAGE_SIZE).to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let rows: Vec<GammaMarket> = response.json().await?;
        let page_len = rows.len();

        for market in rows {
            catalog.insert(
                market.condition_id,
                MarketCatalogEntry {
                    question: market.question.unwrap_or_default(),
                    outcomes: market.outcomes,
                },
            );
        }

        if (page_len as u32) < PAGE_SIZE {
            break;
        }
    }

    debug!(markets = catalog.len(), "fetched market catalog");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcomes_as_plain_array() {
        let m: GammaMarket = serde_json::from_value(json!({
            "conditionId": "0xabc",
            "question": "Will it rain?",
            "outcomes": ["Yes", "No"]
        }))
        .unwrap();
        assert_eq!(m.outcomes, vec!["Yes", "No"]);
    }

    #[test]
    fn test_outcomes_as_encoded_string() {
        let m: GammaMarket = serde_json::from_value(json!({
            "conditionId": "0xabc",
            "outcomes": "[\"Yes\",\"No\"]"
        }))
        .unwrap();
        assert_eq!(m.outcomes, vec!["Yes", "No"]);
        assert_eq!(m.question, None);
    }

    #[test]
    fn test_outcomes_garbage_becomes_empty() {
        let m: GammaMarket = serde_json::from_value(json!({
            "conditionId": "0xabc",
            "outcomes": "not json",
        }))
        .unwrap();
        assert!(m.outcomes.is_empty());

        let m: GammaMarket = serde_json::from_value(json!({
            "conditionId": "0xabc",
            "outcomes": 7,
        }))
        .unwrap();
        assert!(m.outcomes.is_empty());
    }
}
