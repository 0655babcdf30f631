// Bitget v2 spot adapter. Tickers come wrapped in {code, data:[...]}.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::bitget_types::TickersResponse;
use super::http::HttpClient;
use super::SourceAdapter;
use crate::market_data::error::Result;
use crate::market_data::normaliser::{parse_decimal, strip_quote_suffix, Normaliser, TickerFields, QUOTE_ASSET};
use crate::market_data::types::{MarketRecord, SourceId};

const SUCCESS_CODE: &str = "00000";

pub struct BitgetAdapter {
    http: HttpClient,
    base_url: String, // "https://api.bitget.com"
    normaliser: Normaliser,
}

impl BitgetAdapter {
    pub fn new(http: HttpClient, base_url: &str, normaliser: Normaliser) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            normaliser,
        }
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v2/spot/market/tickers", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for BitgetAdapter {
    type Snapshot = TickersResponse;
    type Metadata = ();

    const SOURCE: SourceId = SourceId::Bitget;

    async fn fetch_snapshot(&self) -> Result<TickersResponse> {
        let response: TickersResponse = self.http.get_json(&self.ticker_url()).await?;
        if !response.code.is_empty() && response.code != SUCCESS_CODE {
            warn!(source = %Self::SOURCE, code = %response.code, msg = %response.msg, "unexpected response code");
        }
        Ok(response)
    }

    fn normalize(&self, snapshot: TickersResponse, _metadata: Option<&()>) -> Vec<MarketRecord> {
        let total = snapshot.data.len();
        let records = snapshot.data.into_iter().filter_map(|t| {
            let base = strip_quote_suffix(&t.symbol, QUOTE_ASSET)?;
            let fields = TickerFields {
                symbol: base.to_string(),
                display_name: None,
                source_symbol: t.symbol.clone(),
                price: parse_decimal(t.last_pr.as_deref()?)?,
                reference_price: t.open.as_deref().and_then(parse_decimal),
                volume: parse_decimal(t.base_volume.as_deref()?)?,
                quote_volume: parse_decimal(t.quote_volume.as_deref()?)?,
            };
            self.normaliser.record(fields)
        });
        let records = self.normaliser.finish(records);
        debug!(source = %Self::SOURCE, total, kept = records.len(), "normalized tickers");
        records
    }
}
