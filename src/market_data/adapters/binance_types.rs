// Source: https://api.binance.com/api/v3/ticker/24hr (no symbol param -> every pair)
use serde::Deserialize;

use crate::market_data::normaliser::lenient_vec;

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Tickers24h(#[serde(deserialize_with = "lenient_vec")] pub Vec<Ticker24h>);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub last_price: Option<String>,
    pub prev_close_price: Option<String>,
    pub volume: Option<String>,     // base asset
    pub quote_volume: Option<String>,
    // we ignore the other fields for now
}

// Source: https://api.binance.com/api/v3/exchangeInfo
#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,     // "TRADING", "BREAK", "HALT", ...
    pub base_asset: String, // e.g. "BTC"
}
