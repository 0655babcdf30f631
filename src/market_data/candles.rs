// OHLCV klines for the spot venues the terminal charts.
//
// Each venue differs in symbol format, query parameter names, time unit of
// the range bounds and response envelope; rows are always
// `[ts_ms, open, high, low, close, volume, ...]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Endpoints;
use crate::market_data::adapters::HttpClient;
use crate::market_data::error::Result;
use crate::market_data::normaliser::FlexNum;
use crate::market_data::types::SourceId;

pub const DEFAULT_CANDLE_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleVenue {
    Binance,
    Bybit,
    Bitget,
    Okx,
}

impl CandleVenue {
    pub fn supported() -> &'static [CandleVenue] {
        &[CandleVenue::Binance, CandleVenue::Bybit, CandleVenue::Bitget, CandleVenue::Okx]
    }

    pub fn from_name(name: &str) -> Option<CandleVenue> {
        Self::supported()
            .iter()
            .copied()
            .find(|v| v.source().as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub fn source(&self) -> SourceId {
        match self {
            CandleVenue::Binance => SourceId::Binance,
            CandleVenue::Bybit => SourceId::Bybit,
            CandleVenue::Bitget => SourceId::Bitget,
            CandleVenue::Okx => SourceId::Okx,
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.source().display_name()
    }

    /// `"btc/usdt"` -> venue instrument id.
    pub fn format_symbol(&self, symbol: &str) -> String {
        match self {
            CandleVenue::Binance => symbol.replace('/', "").to_uppercase(),
            CandleVenue::Bybit | CandleVenue::Bitget => symbol.replace('/', ""),
            CandleVenue::Okx => symbol.replace('/', "-"),
        }
    }

    pub fn kline_url(&self, base_url: &str, query: &CandleQuery) -> String {
        let base = base_url.trim_end_matches('/');
        let symbol = self.format_symbol(&query.symbol);
        let (path, mut url) = match self {
            CandleVenue::Binance => (
                "/api/v3/klines",
                format!("symbol={symbol}&interval={}&limit={}", query.interval, query.limit),
            ),
            CandleVenue::Bybit => (
                "/v5/market/kline",
                format!("category=spot&symbol={symbol}&interval={}&limit={}", query.interval, query.limit),
            ),
            CandleVenue::Bitget => (
                "/api/v2/spot/market/candles",
                format!("symbol={symbol}&period={}&limit={}", query.interval, query.limit),
            ),
            CandleVenue::Okx => (
                "/api/v5/market/candles",
                format!("instId={symbol}&bar={}&limit={}", query.interval, query.limit),
            ),
        };

        // Binance and OKX take milliseconds, Bybit and Bitget seconds
        let (start_key, end_key, in_seconds) = match self {
            CandleVenue::Binance => ("startTime", "endTime", false),
            CandleVenue::Bybit => ("start", "end", true),
            CandleVenue::Bitget => ("after", "before", true),
            CandleVenue::Okx => ("after", "before", false),
        };
        let scale = |ms: u64| if in_seconds { ms / 1000 } else { ms };
        if let Some(start) = query.start_ms {
            url.push_str(&format!("&{start_key}={}", scale(start)));
        }
        if let Some(end) = query.end_ms {
            url.push_str(&format!("&{end_key}={}", scale(end)));
        }
        format!("{base}{path}?{url}")
    }

    /// Extract rows from the venue envelope. Unknown shapes yield no candles.
    pub fn parse_klines(&self, body: &Value) -> Vec<Candle> {
        let rows = match self {
            CandleVenue::Binance => body.as_array(),
            CandleVenue::Bybit => body.pointer("/result/list").and_then(Value::as_array),
            CandleVenue::Bitget | CandleVenue::Okx => body.get("data").and_then(Value::as_array),
        };
        rows.map(|rows| rows.iter().filter_map(Candle::from_row).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    /// Pair as "BASE/QUOTE", e.g. "BTC/USDT".
    pub symbol: String,
    /// Venue-native interval string ("1m", "60", "1H", ...).
    pub interval: String,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub limit: u32,
}

impl CandleQuery {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            start_ms: None,
            end_ms: None,
            limit: DEFAULT_CANDLE_LIMIT,
        }
    }

    pub fn range(mut self, start_ms: Option<u64>, end_ms: Option<u64>) -> Self {
        self.start_ms = start_ms;
        self.end_ms = end_ms;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    /// Open time, unix seconds.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    fn from_row(row: &Value) -> Option<Candle> {
        let cells = row.as_array()?;
        let num = |i: usize| -> f64 {
            cells
                .get(i)
                .and_then(|v| FlexNum::deserialize(v).ok())
                .and_then(|n| n.value())
                .unwrap_or(f64::NAN)
        };
        let ts_ms = num(0);
        if !ts_ms.is_finite() {
            return None;
        }
        Some(Candle {
            time: (ts_ms / 1000.0).floor() as i64,
            open: num(1),
            high: num(2),
            low: num(3),
            close: num(4),
            volume: num(5),
        })
    }
}

/// Fetches klines from any supported venue over the shared HTTP client.
#[derive(Debug, Clone)]
pub struct CandleClient {
    http: HttpClient,
    endpoints: Endpoints,
}

impl CandleClient {
    pub fn new(http: HttpClient, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    pub async fn fetch_candles(&self, venue: CandleVenue, query: &CandleQuery) -> Result<Vec<Candle>> {
        let url = venue.kline_url(self.endpoints.base_url(venue.source()), query);
        let body: Value = self.http.get_json(&url).await?;
        let candles = venue.parse_klines(&body);
        debug!(venue = %venue.source(), symbol = %query.symbol, candles = candles.len(), "fetched klines");
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_venue_lookup() {
        assert_eq!(CandleVenue::from_name("OKX"), Some(CandleVenue::Okx));
        assert_eq!(CandleVenue::from_name("Binance"), Some(CandleVenue::Binance));
        assert_eq!(CandleVenue::from_name("hyperliquid"), None);
        assert_eq!(CandleVenue::supported().len(), 4);
        assert_eq!(CandleVenue::Okx.display_name(), "OKX");
    }

    #[test]
    fn test_format_symbol() {
        assert_eq!(CandleVenue::Binance.format_symbol("btc/usdt"), "BTCUSDT");
        assert_eq!(CandleVenue::Bybit.format_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(CandleVenue::Okx.format_symbol("BTC/USDT"), "BTC-USDT");
    }

    #[test]
    fn test_kline_urls() {
        let q = CandleQuery::new("BTC/USDT", "1h").range(Some(1_700_000_000_000), Some(1_700_003_600_000)).limit(200);
        assert_eq!(
            CandleVenue::Binance.kline_url("https://api.binance.com", &q),
            "https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=1h&limit=200&startTime=1700000000000&endTime=1700003600000"
        );
        assert_eq!(
            CandleVenue::Bybit.kline_url("https://api.bybit.com/", &q),
            "https://api.bybit.com/v5/market/kline?category=spot&symbol=BTCUSDT&interval=1h&limit=200&start=1700000000&end=1700003600"
        );
        assert_eq!(
            CandleVenue::Bitget.kline_url("https://api.bitget.com", &q),
            "https://api.bitget.com/api/v2/spot/market/candles?symbol=BTCUSDT&period=1h&limit=200&after=1700000000&before=1700003600"
        );
        let q = CandleQuery::new("ETH/USDT", "1H");
        assert_eq!(
            CandleVenue::Okx.kline_url("https://www.okx.com", &q),
            "https://www.okx.com/api/v5/market/candles?instId=ETH-USDT&bar=1H&limit=1000"
        );
    }

    #[test]
    fn test_parse_binance_rows() {
        let body = json!([
            [1700000000000u64, "1.0", "2.0", "0.5", "1.5", "100.0", 1700000059999u64],
            ["garbage", "1", "1", "1", "1", "1"],
            "not a row"
        ]);
        let candles = CandleVenue::Binance.parse_klines(&body);
        assert_eq!(
            candles,
            vec![Candle { time: 1_700_000_000, open: 1.0, high: 2.0, low: 0.5, close: 1.5, volume: 100.0 }]
        );
    }

    #[test]
    fn test_parse_envelopes() {
        let row = json!(["1700000000000", "1", "2", "0.5", "1.5", "10"]);
        let bybit = json!({"retCode": 0, "result": {"list": [row.clone()]}});
        let okx = json!({"code": "0", "data": [row.clone()]});
        assert_eq!(CandleVenue::Bybit.parse_klines(&bybit).len(), 1);
        assert_eq!(CandleVenue::Okx.parse_klines(&okx).len(), 1);
        assert_eq!(CandleVenue::Bitget.parse_klines(&okx)[0].time, 1_700_000_000);
        assert!(CandleVenue::Bybit.parse_klines(&json!({"retCode": 10001})).is_empty());
        assert!(CandleVenue::Binance.parse_klines(&json!({"code": -1121})).is_empty());
    }
}
