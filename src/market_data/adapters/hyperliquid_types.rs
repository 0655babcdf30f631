// Source: https://api.hyperliquid.xyz/info (perp universe + per-asset 24h stats)
use ahash::AHashMap;
use serde::{Deserialize, Deserializer};

use crate::market_data::normaliser::{lenient_vec, FlexNum};

#[derive(Debug, Deserialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub meta: Option<PerpMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpMeta {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub universe: Vec<PerpAsset>,
    #[serde(default, deserialize_with = "lenient_stats")]
    pub perp_stats: AHashMap<String, PerpStats>, // keyed by asset name
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerpAsset {
    pub name: String, // e.g. "ETH"
    // szDecimals, maxLeverage, ... ignored
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpStats {
    pub mark_price: Option<FlexNum>,
    pub prev_day_price: Option<FlexNum>,
    pub volume24h: Option<FlexNum>, // base asset units
}

// Drop stats entries that are not objects of the expected shape.
fn lenient_stats<'de, D>(deserializer: D) -> Result<AHashMap<String, PerpStats>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Map<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| serde_json::from_value(value).ok().map(|stats| (name, stats)))
        .collect())
}
