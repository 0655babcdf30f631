// Hyperliquid perp adapter.
// One GET /info returns the asset universe plus 24h stats; there is no quote
// volume on the wire so it is derived as volume * markPrice.

use async_trait::async_trait;
use tracing::debug;

use super::http::HttpClient;
use super::hyperliquid_types::InfoResponse;
use super::SourceAdapter;
use crate::market_data::error::Result;
use crate::market_data::normaliser::{Normaliser, TickerFields};
use crate::market_data::types::{MarketRecord, SourceId};

pub struct HyperliquidAdapter {
    http: HttpClient,
    base_url: String, // "https://api.hyperliquid.xyz"
    normaliser: Normaliser,
}

impl HyperliquidAdapter {
    pub fn new(http: HttpClient, base_url: &str, normaliser: Normaliser) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            normaliser,
        }
    }

    fn info_url(&self) -> String {
        format!("{}/info", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for HyperliquidAdapter {
    type Snapshot = InfoResponse;
    type Metadata = ();

    const SOURCE: SourceId = SourceId::Hyperliquid;

    async fn fetch_snapshot(&self) -> Result<InfoResponse> {
        self.http.get_json(&self.info_url()).await
    }

    fn normalize(&self, snapshot: InfoResponse, _metadata: Option<&()>) -> Vec<MarketRecord> {
        let Some(meta) = snapshot.meta else {
            debug!(source = %Self::SOURCE, "payload has no meta, nothing to normalize");
            return Vec::new();
        };

        let total = meta.universe.len();
        let records = meta.universe.into_iter().filter_map(|asset| {
            let stats = meta.perp_stats.get(&asset.name)?;
            let price = stats.mark_price.as_ref()?.value()?;
            let volume = stats.volume24h.as_ref().and_then(|v| v.value()).unwrap_or(0.0);
            let fields = TickerFields {
                symbol: asset.name.clone(),
                display_name: None,
                source_symbol: asset.name,
                price,
                reference_price: stats.prev_day_price.as_ref().and_then(|p| p.value()),
                volume,
                quote_volume: volume * price,
            };
            self.normaliser.record(fields)
        });
        let records = self.normaliser.finish(records);
        debug!(source = %Self::SOURCE, total, kept = records.len(), "normalized perp stats");
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::normaliser::MIN_QUOTE_VOLUME;
    use std::time::Duration;

    fn adapter() -> HyperliquidAdapter {
        HyperliquidAdapter::new(
            HttpClient::new(Duration::from_secs(1)).unwrap(),
            "https://api.hyperliquid.xyz",
            Normaliser::new(SourceId::Hyperliquid, MIN_QUOTE_VOLUME),
        )
    }

    #[test]
    fn test_url() {
        assert_eq!(adapter().info_url(), "https://api.hyperliquid.xyz/info");
    }

    #[test]
    fn test_normalize_derives_quote_volume() {
        let payload: InfoResponse = serde_json::from_str(
            r#"{"meta":{
                "universe":[{"name":"ETH","szDecimals":4},{"name":"HYPE"},{"name":"DUST"},{"name":"NOSTATS"},{"oops":1}],
                "perpStats":{
                    "ETH":{"markPrice":3000.0,"prevDayPrice":2000.0,"volume24h":100.0},
                    "HYPE":{"markPrice":"20.5","volume24h":"10000"},
                    "DUST":{"markPrice":0.01,"prevDayPrice":0.01,"volume24h":1000.0},
                    "BROKEN":"not an object"
                }
            }}"#,
        )
        .unwrap();
        let records = adapter().normalize(payload, None);
        let symbols: Vec<&str> = records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "HYPE"]);

        let eth = &records[0];
        assert_eq!(eth.quote_volume, 300_000.0);
        assert_eq!(eth.estimated_market_cap, 3_000_000.0);
        assert_eq!(eth.percent_change, 50.0);
        assert_eq!(eth.source_symbol, "ETH");

        let hype = &records[1];
        assert_eq!(hype.quote_volume, 205_000.0);
        assert_eq!(hype.absolute_change, 0.0);
    }

    #[test]
    fn test_missing_meta_yields_nothing() {
        let payload: InfoResponse = serde_json::from_str(r#"{"universe":[]}"#).unwrap();
        assert!(adapter().normalize(payload, None).is_empty());
    }
}
