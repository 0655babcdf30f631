// Bybit v5 spot adapter. Tickers come wrapped in {retCode, result:{list}}.

use async_trait::async_trait;
use tracing::debug;

use super::bybit_types::TickersResponse;
use super::http::HttpClient;
use super::SourceAdapter;
use crate::market_data::error::{MarketDataError, Result};
use crate::market_data::normaliser::{parse_decimal, strip_quote_suffix, Normaliser, TickerFields, QUOTE_ASSET};
use crate::market_data::types::{MarketRecord, SourceId};

pub struct BybitAdapter {
    http: HttpClient,
    base_url: String, // "https://api.bybit.com"
    normaliser: Normaliser,
}

impl BybitAdapter {
    pub fn new(http: HttpClient, base_url: &str, normaliser: Normaliser) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            normaliser,
        }
    }

    fn ticker_url(&self) -> String {
        format!("{}/v5/market/tickers?category=spot", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for BybitAdapter {
    type Snapshot = TickersResponse;
    type Metadata = ();

    const SOURCE: SourceId = SourceId::Bybit;

    async fn fetch_snapshot(&self) -> Result<TickersResponse> {
        let url = self.ticker_url();
        let response: TickersResponse = self.http.get_json(&url).await?;
        // Bybit reports API-level failures with HTTP 200 and a non-zero retCode
        if response.ret_code != 0 {
            return Err(MarketDataError::Parse {
                url,
                message: format!("retCode {}: {}", response.ret_code, response.ret_msg),
            });
        }
        Ok(response)
    }

    fn normalize(&self, snapshot: TickersResponse, _metadata: Option<&()>) -> Vec<MarketRecord> {
        let total = snapshot.result.list.len();
        let records = snapshot.result.list.into_iter().filter_map(|t| {
            let base = strip_quote_suffix(&t.symbol, QUOTE_ASSET)?;
            let fields = TickerFields {
                symbol: base.to_string(),
                display_name: None,
                source_symbol: t.symbol.clone(),
                price: parse_decimal(t.last_price.as_deref()?)?,
                reference_price: t.prev_price24h.as_deref().and_then(parse_decimal),
                volume: parse_decimal(t.volume24h.as_deref()?)?,
                quote_volume: parse_decimal(t.turnover24h.as_deref()?)?,
            };
            self.normaliser.record(fields)
        });
        let records = self.normaliser.finish(records);
        debug!(source = %Self::SOURCE, total, kept = records.len(), "normalized tickers");
        records
    }
}
