// Market data module entrypoint
pub mod adapters;    // venue-specific fetchers + normalization (Binance, Bybit, Bitget, Hyperliquid)
pub mod aggregator;  // fan-out fetch, partial failure, scheduled reconciliation
pub mod cache;       // per-source TTL cache with single-flight fetches
pub mod candles;     // OHLCV klines for charting venues
pub mod error;
pub mod normaliser;  // wire strings -> canonical records
pub mod reconcile;   // merge refreshed snapshots into cached sets
pub mod registry;    // source id -> adapter lookup
pub mod types;

pub use aggregator::{MarketDataAggregator, UpdateReport};
pub use cache::{CacheStore, EntryState, Reconciled, SourceStatus};
pub use error::{MarketDataError, Result};
pub use types::{MarketRecord, RecordSet, SourceId};
