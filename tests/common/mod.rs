#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use marketx_rs::market_data::adapters::MarketSource;
use marketx_rs::market_data::{MarketDataError, MarketRecord, Result, SourceId};

/// Source that replays a scripted sequence of outcomes and counts calls.
/// The last outcome repeats once the script is exhausted. A step without its
/// own delay uses the source-wide one.
pub struct ScriptedSource {
    id: SourceId,
    calls: AtomicUsize,
    script: Mutex<VecDeque<(Option<Duration>, Result<Vec<MarketRecord>>)>>,
    last: Mutex<Option<Result<Vec<MarketRecord>>>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new(id: SourceId) -> Self {
        Self {
            id,
            calls: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
        }
    }

    pub fn then_ok(self, records: Vec<MarketRecord>) -> Self {
        self.script.lock().unwrap().push_back((None, Ok(records)));
        self
    }

    pub fn then_ok_after(self, delay: Duration, records: Vec<MarketRecord>) -> Self {
        self.script.lock().unwrap().push_back((Some(delay), Ok(records)));
        self
    }

    pub fn then_err(self, err: MarketDataError) -> Self {
        self.script.lock().unwrap().push_back((None, Err(err)));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSource for ScriptedSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn name(&self) -> &str {
        self.id.display_name()
    }

    async fn fetch_records(&self) -> Result<Vec<MarketRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let delay = next.as_ref().and_then(|(delay, _)| *delay).unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut last = self.last.lock().unwrap();
        match next {
            Some((_, outcome)) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last.clone().unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}

pub fn rec(source: SourceId, symbol: &str, price: f64) -> MarketRecord {
    let quote_volume = 250_000.0;
    MarketRecord {
        symbol: symbol.to_string(),
        display_name: symbol.to_string(),
        price,
        absolute_change: 0.0,
        percent_change: 0.0,
        volume: quote_volume / price,
        quote_volume,
        estimated_market_cap: quote_volume * 10.0,
        source,
        source_symbol: format!("{symbol}USDT"),
    }
}

pub fn unavailable() -> MarketDataError {
    MarketDataError::HttpStatus {
        url: "mock://tickers".into(),
        status: 503,
    }
}

pub fn refused() -> MarketDataError {
    MarketDataError::Network {
        url: "mock://tickers".into(),
        message: "connection refused".into(),
    }
}
