// Binance spot adapter: 24h ticker array + exchangeInfo catalog for status and names.

use ahash::AHashMap;
use async_trait::async_trait;
use tracing::debug;

use super::binance_types::{ExchangeInfo, SymbolInfo, Tickers24h};
use super::http::HttpClient;
use super::{Capabilities, SourceAdapter};
use crate::market_data::error::Result;
use crate::market_data::normaliser::{parse_decimal, strip_quote_suffix, Normaliser, TickerFields, QUOTE_ASSET};
use crate::market_data::types::{MarketRecord, SourceId};

const TRADING: &str = "TRADING";

pub struct BinanceAdapter {
    http: HttpClient,
    base_url: String, // "https://api.binance.com"
    normaliser: Normaliser,
}

impl BinanceAdapter {
    pub fn new(http: HttpClient, base_url: &str, normaliser: Normaliser) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            normaliser,
        }
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v3/ticker/24hr", self.base_url)
    }

    fn exchange_info_url(&self) -> String {
        format!("{}/api/v3/exchangeInfo", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for BinanceAdapter {
    type Snapshot = Tickers24h;
    type Metadata = ExchangeInfo;

    const SOURCE: SourceId = SourceId::Binance;

    fn capabilities(&self) -> Capabilities {
        Capabilities::WITH_METADATA
    }

    async fn fetch_snapshot(&self) -> Result<Tickers24h> {
        self.http.get_json(&self.ticker_url()).await
    }

    async fn fetch_metadata(&self) -> Result<Option<ExchangeInfo>> {
        self.http.get_json(&self.exchange_info_url()).await.map(Some)
    }

    fn normalize(&self, snapshot: Tickers24h, metadata: Option<&ExchangeInfo>) -> Vec<MarketRecord> {
        // symbol -> catalog entry; absent catalog means no status filter
        let catalog: Option<AHashMap<&str, &SymbolInfo>> = metadata.map(|info| {
            info.symbols.iter().map(|s| (s.symbol.as_str(), s)).collect()
        });

        let total = snapshot.0.len();
        let records = snapshot.0.into_iter().filter_map(|t| {
            let base = strip_quote_suffix(&t.symbol, QUOTE_ASSET)?;
            let info = match &catalog {
                Some(catalog) => {
                    let info = catalog.get(t.symbol.as_str())?;
                    if info.status != TRADING {
                        return None;
                    }
                    Some(*info)
                }
                None => None,
            };
            let fields = TickerFields {
                symbol: base.to_string(),
                display_name: info.map(|i| i.base_asset.clone()),
                source_symbol: t.symbol.clone(),
                price: parse_decimal(t.last_price.as_deref()?)?,
                reference_price: t.prev_close_price.as_deref().and_then(parse_decimal),
                volume: parse_decimal(t.volume.as_deref()?)?,
                quote_volume: parse_decimal(t.quote_volume.as_deref()?)?,
            };
            self.normaliser.record(fields)
        });
        let records = self.normaliser.finish(records);
        debug!(source = %Self::SOURCE, total, kept = records.len(), "normalized tickers");
        records
    }
}
