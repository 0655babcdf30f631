// Source: https://api.bybit.com/v5/market/tickers?category=spot
use serde::Deserialize;

use crate::market_data::normaliser::lenient_vec;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickersResponse {
    #[serde(default)]
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: TickersResult,
}

#[derive(Debug, Deserialize)]
pub struct TickersResult {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub list: Vec<SpotTicker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotTicker {
    pub symbol: String,
    pub last_price: Option<String>,
    pub prev_price24h: Option<String>,
    pub volume24h: Option<String>,   // base asset
    pub turnover24h: Option<String>, // quote asset
}
