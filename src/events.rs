use serde::{Deserialize, Serialize};

/// Events flowing through the main loop channel.
#[derive(Debug)]
pub enum Event {
    /// One-second heartbeat. Drives the poll scheduler and the countdown.
    Tick,

    /// Ctrl+C or kill signal
    Shutdown,
}

/// Taker side of a fill, as reported by the data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl Side {
    /// Wire form, also used in trade fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
