use std::time::Duration;

use marketx_rs::market_data::adapters::binance_types::Tickers24h;
use marketx_rs::market_data::adapters::bitget_types::TickersResponse as BitgetTickers;
use marketx_rs::market_data::adapters::bybit_types::TickersResponse;
use marketx_rs::market_data::adapters::hyperliquid_types::InfoResponse;
use marketx_rs::market_data::adapters::{BinanceAdapter, BitgetAdapter, BybitAdapter, HttpClient, HyperliquidAdapter, SourceAdapter};
use marketx_rs::market_data::normaliser::{Normaliser, MIN_QUOTE_VOLUME};
use marketx_rs::market_data::SourceId;
use proptest::prelude::*;
use serde_json::{json, Value};

fn http() -> HttpClient {
    HttpClient::new(Duration::from_secs(1)).unwrap()
}

// (base, price, quote volume); volumes straddle the gate, including exactly at it
fn ticker_row() -> impl Strategy<Value = (String, f64, f64)> {
    (
        "[A-Z]{2,5}",
        0.0001f64..100_000.0,
        prop_oneof![Just(MIN_QUOTE_VOLUME), 0.0f64..1_000_000.0],
    )
}

proptest! {
    #[test]
    fn binance_records_clear_liquidity_gate(rows in prop::collection::vec(ticker_row(), 0..40)) {
        let payload: Vec<Value> = rows
            .iter()
            .map(|(base, price, qv)| json!({
                "symbol": format!("{base}USDT"),
                "lastPrice": price.to_string(),
                "prevClosePrice": price.to_string(),
                "volume": (qv / price).to_string(),
                "quoteVolume": qv.to_string(),
            }))
            .collect();
        let snapshot: Tickers24h = serde_json::from_value(Value::Array(payload)).unwrap();
        let adapter = BinanceAdapter::new(http(), "http://localhost", Normaliser::new(SourceId::Binance, MIN_QUOTE_VOLUME));

        let records = adapter.normalize(snapshot, None);
        for r in &records {
            prop_assert!(r.quote_volume > MIN_QUOTE_VOLUME);
            prop_assert_eq!(format!("{}USDT", r.symbol), r.source_symbol.clone());
            prop_assert_eq!(r.estimated_market_cap, r.quote_volume * 10.0);
        }
        let expected = rows.iter().filter(|(_, _, qv)| *qv > MIN_QUOTE_VOLUME).count();
        prop_assert!(records.len() <= expected);
    }

    #[test]
    fn bybit_records_clear_liquidity_gate(rows in prop::collection::vec(ticker_row(), 0..40)) {
        let list: Vec<Value> = rows
            .iter()
            .map(|(base, price, qv)| json!({
                "symbol": format!("{base}USDT"),
                "lastPrice": price.to_string(),
                "prevPrice24h": price.to_string(),
                "volume24h": (qv / price).to_string(),
                "turnover24h": qv.to_string(),
            }))
            .collect();
        let snapshot: TickersResponse =
            serde_json::from_value(json!({"retCode": 0, "retMsg": "OK", "result": {"list": list}})).unwrap();
        let adapter = BybitAdapter::new(http(), "http://localhost", Normaliser::new(SourceId::Bybit, MIN_QUOTE_VOLUME));

        for r in adapter.normalize(snapshot, None) {
            prop_assert!(r.quote_volume > MIN_QUOTE_VOLUME);
            prop_assert_eq!(r.percent_change, 0.0);
        }
    }

    #[test]
    fn bitget_records_clear_liquidity_gate(rows in prop::collection::vec(ticker_row(), 0..40)) {
        let data: Vec<Value> = rows
            .iter()
            .map(|(base, price, qv)| json!({
                "symbol": format!("{base}USDT"),
                "lastPr": price.to_string(),
                "open": "0",
                "baseVolume": (qv / price).to_string(),
                "quoteVolume": qv.to_string(),
            }))
            .collect();
        let snapshot: BitgetTickers =
            serde_json::from_value(json!({"code": "00000", "msg": "success", "data": data})).unwrap();
        let adapter = BitgetAdapter::new(http(), "http://localhost", Normaliser::new(SourceId::Bitget, MIN_QUOTE_VOLUME));

        for r in adapter.normalize(snapshot, None) {
            prop_assert!(r.quote_volume > MIN_QUOTE_VOLUME);
            prop_assert_eq!(r.absolute_change, 0.0);
            prop_assert_eq!(r.source, SourceId::Bitget);
        }
    }

    #[test]
    fn hyperliquid_derived_volume_clears_liquidity_gate(
        rows in prop::collection::vec(("[A-Z]{2,5}", 0.0001f64..100_000.0, 0.0f64..1_000_000.0), 0..40)
    ) {
        let universe: Vec<Value> = rows.iter().map(|(name, _, _)| json!({"name": name})).collect();
        let stats: serde_json::Map<String, Value> = rows
            .iter()
            .map(|(name, price, volume)| {
                (name.clone(), json!({"markPrice": price.to_string(), "prevDayPrice": price, "volume24h": volume.to_string()}))
            })
            .collect();
        let snapshot: InfoResponse =
            serde_json::from_value(json!({"meta": {"universe": universe, "perpStats": stats}})).unwrap();
        let adapter = HyperliquidAdapter::new(http(), "http://localhost", Normaliser::new(SourceId::Hyperliquid, MIN_QUOTE_VOLUME));

        let records = adapter.normalize(snapshot, None);
        for r in &records {
            prop_assert!(r.quote_volume > MIN_QUOTE_VOLUME);
            prop_assert_eq!(r.quote_volume, r.volume * r.price);
        }
        // one record per asset name
        let mut names: Vec<&str> = records.iter().map(|r| r.source_symbol.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        prop_assert_eq!(names.len(), records.len());
    }
}

#[test]
fn btcusdt_maps_to_btc_everywhere() {
    let binance = BinanceAdapter::new(http(), "http://localhost", Normaliser::new(SourceId::Binance, MIN_QUOTE_VOLUME));
    let snapshot: Tickers24h = serde_json::from_value(json!([{
        "symbol": "BTCUSDT", "lastPrice": "60000", "prevClosePrice": "60000", "volume": "100", "quoteVolume": "6000000"
    }]))
    .unwrap();
    assert_eq!(binance.normalize(snapshot, None)[0].symbol, "BTC");

    let bybit = BybitAdapter::new(http(), "http://localhost", Normaliser::new(SourceId::Bybit, MIN_QUOTE_VOLUME));
    let snapshot: TickersResponse = serde_json::from_value(json!({"retCode": 0, "result": {"list": [{
        "symbol": "BTCUSDT", "lastPrice": "60000", "prevPrice24h": "60000", "volume24h": "100", "turnover24h": "6000000"
    }]}}))
    .unwrap();
    assert_eq!(bybit.normalize(snapshot, None)[0].symbol, "BTC");
}
