// Shared traits for exchange ticker adapters.
//
// `SourceAdapter` is the typed side: each exchange names its own wire DTOs.
// `MarketSource` is the object-safe side the registry and cache hold as
// `Arc<dyn MarketSource>`; every `SourceAdapter` gets it for free.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AggregatorConfig;
use crate::market_data::error::Result;
use crate::market_data::normaliser::Normaliser;
use crate::market_data::types::{MarketRecord, SourceId};

pub mod binance;
pub mod binance_types;
pub mod bitget;
pub mod bitget_types;
pub mod bybit;
pub mod bybit_types;
pub mod http;
pub mod hyperliquid;
pub mod hyperliquid_types;

pub use binance::BinanceAdapter;
pub use bitget::BitgetAdapter;
pub use bybit::BybitAdapter;
pub use http::HttpClient;
pub use hyperliquid::HyperliquidAdapter;

/// Optional calls an adapter supports beyond the ticker snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Adapter needs `fetch_metadata` (symbol status / names catalog).
    pub metadata: bool,
}

impl Capabilities {
    pub const SNAPSHOT_ONLY: Capabilities = Capabilities { metadata: false };
    pub const WITH_METADATA: Capabilities = Capabilities { metadata: true };
}

#[async_trait]
pub trait SourceAdapter: Send + Sync + 'static {
    /// Parsed, not yet normalized ticker payload.
    type Snapshot: Send + 'static;
    /// Parsed secondary catalog; `()` for adapters without one.
    type Metadata: Send + Sync + 'static;

    const SOURCE: SourceId;

    fn capabilities(&self) -> Capabilities {
        Capabilities::SNAPSHOT_ONLY
    }

    async fn fetch_snapshot(&self) -> Result<Self::Snapshot>;

    /// Only called when `capabilities().metadata` is set.
    async fn fetch_metadata(&self) -> Result<Option<Self::Metadata>> {
        Ok(None)
    }

    /// Pure transformation. Rows it cannot interpret are dropped, never fatal.
    fn normalize(&self, snapshot: Self::Snapshot, metadata: Option<&Self::Metadata>) -> Vec<MarketRecord>;
}

#[async_trait]
pub trait MarketSource: Send + Sync {
    fn id(&self) -> SourceId;

    fn name(&self) -> &str;

    /// Fetch and normalize one full record set.
    async fn fetch_records(&self) -> Result<Vec<MarketRecord>>;
}

#[async_trait]
impl<A: SourceAdapter> MarketSource for A {
    fn id(&self) -> SourceId {
        A::SOURCE
    }

    fn name(&self) -> &str {
        A::SOURCE.display_name()
    }

    async fn fetch_records(&self) -> Result<Vec<MarketRecord>> {
        let (snapshot, metadata) = if self.capabilities().metadata {
            tokio::try_join!(self.fetch_snapshot(), self.fetch_metadata())?
        } else {
            (self.fetch_snapshot().await?, None)
        };
        Ok(self.normalize(snapshot, metadata.as_ref()))
    }
}

/// The four ticker feeds the terminal aggregates, in display order.
pub fn default_sources(config: &AggregatorConfig, http: &HttpClient) -> Vec<Arc<dyn MarketSource>> {
    let endpoints = &config.endpoints;
    let min = config.min_quote_volume;
    vec![
        Arc::new(BinanceAdapter::new(
            http.clone(),
            endpoints.base_url(SourceId::Binance),
            Normaliser::new(SourceId::Binance, min),
        )),
        Arc::new(BybitAdapter::new(
            http.clone(),
            endpoints.base_url(SourceId::Bybit),
            Normaliser::new(SourceId::Bybit, min),
        )),
        Arc::new(BitgetAdapter::new(
            http.clone(),
            endpoints.base_url(SourceId::Bitget),
            Normaliser::new(SourceId::Bitget, min),
        )),
        Arc::new(HyperliquidAdapter::new(
            http.clone(),
            endpoints.base_url(SourceId::Hyperliquid),
            Normaliser::new(SourceId::Hyperliquid, min),
        )),
    ]
}
