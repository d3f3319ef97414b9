use tracing::{debug, warn};

use crate::api::FeedError;
use crate::trade::Trade;

const DATA_API_URL: &str = "https://data-api.polymarket.com/trades";

/// Fetch the most recent trades from the public data API, newest first.
pub async fn fetch_trades(client: &reqwest::Client, limit: u32) -> Result<Vec<Trade>, FeedError> {
    let response = client
        .get(DATA_API_URL)
        .query(&[("limit", limit.to_string())])
        .send()
        .await?
        .error_for_status()?;

    let body = response.text().await?;
    decode_rows(&body)
}

/// Decode a trades response body.
///
/// Each row is decoded individually: a malformed record (missing id,
/// timestamp, size, price, or side) is dropped with a log line instead of
/// sinking the whole batch. Only an unparseable body is an error.
pub(crate) fn decode_rows(body: &str) -> Result<Vec<Trade>, FeedError> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(body)?;

    let mut trades = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        match serde_json::from_value::<Trade>(row) {
            Ok(t) => trades.push(t),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "skipping malformed trade record");
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, kept = trades.len(), "dropped malformed trade records");
    }

    Ok(trades)
}
