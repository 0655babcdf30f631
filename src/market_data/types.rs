use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Exchanges the terminal knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Binance,
    Bybit,
    Bitget,
    Hyperliquid,
    Okx,
}

impl SourceId {
    pub const ALL: [SourceId; 5] = [
        SourceId::Binance,
        SourceId::Bybit,
        SourceId::Bitget,
        SourceId::Hyperliquid,
        SourceId::Okx,
    ];

    /// Wire identifier, also used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Binance => "binance",
            SourceId::Bybit => "bybit",
            SourceId::Bitget => "bitget",
            SourceId::Hyperliquid => "hyperliquid",
            SourceId::Okx => "okx",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::Binance => "Binance",
            SourceId::Bybit => "Bybit",
            SourceId::Bitget => "Bitget",
            SourceId::Hyperliquid => "Hyperliquid",
            SourceId::Okx => "OKX",
        }
    }

    /// Case-insensitive lookup by wire identifier.
    pub fn from_name(name: &str) -> Option<SourceId> {
        let name = name.trim();
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical ticker record every adapter converges to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    pub symbol: String,
    pub display_name: String,
    pub price: f64,
    pub absolute_change: f64,
    pub percent_change: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub estimated_market_cap: f64,
    pub source: SourceId,
    pub source_symbol: String,
}

impl MarketRecord {
    pub fn key(&self) -> RecordKey<'_> {
        RecordKey {
            source: self.source,
            source_symbol: &self.source_symbol,
        }
    }
}

/// Identity of a record inside any cached set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey<'a> {
    pub source: SourceId,
    pub source_symbol: &'a str,
}

/// Immutable, cheaply shared record set. Built fully before it is published.
pub type RecordSet = Arc<[MarketRecord]>;
