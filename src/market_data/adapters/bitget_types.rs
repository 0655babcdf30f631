// Source: https://api.bitget.com/api/v2/spot/market/tickers
use serde::Deserialize;

use crate::market_data::normaliser::lenient_vec;

#[derive(Debug, Deserialize)]
pub struct TickersResponse {
    #[serde(default)]
    pub code: String, // "00000" on success
    #[serde(default)]
    pub msg: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<SpotTicker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotTicker {
    pub symbol: String,
    pub last_pr: Option<String>,
    pub open: Option<String>,        // 24h open
    pub base_volume: Option<String>,
    pub quote_volume: Option<String>,
}
