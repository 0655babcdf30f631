// Convert exchange wire values into canonical `MarketRecord`s.
// Every adapter funnels its rows through `Normaliser::record` so the
// liquidity gate and the derived fields are computed one way only.

use itertools::Itertools;
use serde::{Deserialize, Deserializer};
use serde::de::DeserializeOwned;

use crate::market_data::types::{MarketRecord, SourceId};

/// Quote asset every spot adapter filters on.
pub const QUOTE_ASSET: &str = "USDT";

/// Minimum 24h quote volume for a record to be admitted.
pub const MIN_QUOTE_VOLUME: f64 = 100_000.0;

/// `estimated_market_cap = quote_volume * MARKET_CAP_VOLUME_MULTIPLIER`.
/// Crude stand-in that ignores circulating supply; callers rely on the formula.
pub const MARKET_CAP_VOLUME_MULTIPLIER: f64 = 10.0;

/// Parse an exchange decimal string ("1234.56", " 0.01 "). Non-finite values are rejected.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let value: f64 = s.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// `"BTCUSDT"` -> `Some("BTC")`. `None` when the pair is not quoted in `quote`
/// or nothing is left after stripping.
pub fn strip_quote_suffix<'a>(symbol: &'a str, quote: &str) -> Option<&'a str> {
    symbol.strip_suffix(quote).filter(|base| !base.is_empty())
}

/// Numeric wire field that some venues send as a JSON number and others as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlexNum {
    Num(f64),
    Text(String),
}

impl FlexNum {
    pub fn value(&self) -> Option<f64> {
        match self {
            FlexNum::Num(n) => n.is_finite().then_some(*n),
            FlexNum::Text(s) => parse_decimal(s),
        }
    }
}

/// Deserialize a JSON array element by element, dropping elements that do not
/// fit `T` instead of failing the whole payload. `null` reads as empty.
pub fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Already-parsed numbers for one ticker row, before derivation and gating.
#[derive(Debug, Clone)]
pub struct TickerFields {
    pub symbol: String,
    pub display_name: Option<String>,
    pub source_symbol: String,
    pub price: f64,
    /// Price the change is measured against (prev close, 24h open, prev day).
    /// Missing means "no change".
    pub reference_price: Option<f64>,
    pub volume: f64,
    pub quote_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normaliser {
    pub source: SourceId,
    pub min_quote_volume: f64,
}

impl Normaliser {
    pub fn new(source: SourceId, min_quote_volume: f64) -> Self {
        Self { source, min_quote_volume }
    }

    pub fn admits(&self, quote_volume: f64) -> bool {
        quote_volume > self.min_quote_volume
    }

    /// Build a record, or `None` when the row is unusable or below the liquidity gate.
    pub fn record(&self, fields: TickerFields) -> Option<MarketRecord> {
        let TickerFields {
            symbol,
            display_name,
            source_symbol,
            price,
            reference_price,
            volume,
            quote_volume,
        } = fields;

        if !price.is_finite() || price < 0.0 || !volume.is_finite() || !quote_volume.is_finite() {
            return None;
        }
        if !self.admits(quote_volume) {
            return None;
        }

        // an exchange reports 0 when it has no reference yet
        let reference = reference_price
            .filter(|p| p.is_finite() && *p != 0.0)
            .unwrap_or(price);
        let absolute_change = price - reference;
        let percent_change = if reference > 0.0 {
            absolute_change / reference * 100.0
        } else {
            0.0
        };
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| symbol.clone());

        Some(MarketRecord {
            symbol,
            display_name,
            price,
            absolute_change,
            percent_change,
            volume,
            quote_volume,
            estimated_market_cap: quote_volume * MARKET_CAP_VOLUME_MULTIPLIER,
            source: self.source,
            source_symbol,
        })
    }

    /// Enforce one record per `(source, source_symbol)`; first occurrence wins.
    pub fn finish(&self, records: impl IntoIterator<Item = MarketRecord>) -> Vec<MarketRecord> {
        records
            .into_iter()
            .unique_by(|r| (r.source, r.source_symbol.clone()))
            .collect()
    }
}
