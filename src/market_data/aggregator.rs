// Aggregator orchestrates registry + cache: fan-out fetches, partial-failure
// tolerance, scheduled reconciliation and the merged read-only view.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::AggregatorConfig;
use crate::market_data::adapters::{default_sources, HttpClient, MarketSource};
use crate::market_data::cache::{CacheStore, Reconciled, SourceStatus};
use crate::market_data::error::{MarketDataError, Result};
use crate::market_data::reconcile::union_view;
use crate::market_data::types::{MarketRecord, RecordSet, SourceId};
use crate::market_data::registry::SourceRegistry;

/// Outcome of one `update_prices` pass. Failures never abort the pass; they
/// are reported here instead of being raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// Fetched and merged this pass.
    pub refreshed: Vec<SourceId>,
    /// Still within TTL, not fetched.
    pub unchanged: Vec<SourceId>,
    pub failed: Vec<(SourceId, MarketDataError)>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct MarketDataAggregator {
    registry: SourceRegistry,
    cache: CacheStore,
    merged: RwLock<RecordSet>,
    deadline: Option<Duration>,
}

impl MarketDataAggregator {
    /// Aggregator with no sources registered.
    pub fn new(config: &AggregatorConfig) -> Self {
        Self {
            registry: SourceRegistry::new(),
            cache: CacheStore::new(config.cache_ttl()),
            merged: RwLock::new(Arc::from(Vec::new())),
            deadline: config.fan_out_deadline(),
        }
    }

    /// Aggregator wired to Binance, Bybit, Bitget and Hyperliquid.
    pub fn with_default_sources(config: &AggregatorConfig) -> Result<Self> {
        let http = HttpClient::new(config.request_timeout())?;
        let mut aggregator = Self::new(config);
        for source in default_sources(config, &http) {
            aggregator.register_source(source);
        }
        Ok(aggregator)
    }

    pub fn register_source(&mut self, source: Arc<dyn MarketSource>) {
        self.registry.register(source);
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Fetch every source concurrently and return the union of the ones that
    /// succeeded. Errors only when no source succeeded and nothing is cached.
    pub async fn fetch_all_data(&self) -> Result<Vec<MarketRecord>> {
        let outcomes = join_all(self.registry.iter().map(|source| {
            let id = source.id();
            async move { (id, within(self.deadline, id, self.cache.load(source)).await) }
        }))
        .await;

        let mut records = Vec::new();
        let mut succeeded = 0usize;
        let mut failures = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(set) => {
                    succeeded += 1;
                    records.extend(set.iter().cloned());
                }
                Err(err) => failures.push((id, err)),
            }
        }

        if succeeded == 0 && !failures.is_empty() {
            let cached: Vec<RecordSet> = failures
                .iter()
                .filter_map(|(id, _)| self.cache.records(*id))
                .collect();
            if cached.is_empty() {
                return Err(MarketDataError::AllSourcesFailed(failures));
            }
            warn!(failed = failures.len(), "every source failed, serving cached records");
            records = union_view(cached.iter().map(|set| &set[..]));
        } else if !failures.is_empty() {
            for (id, err) in &failures {
                warn!(source = %id, error = %err, "source omitted from aggregate fetch");
            }
        }

        info!(sources = succeeded, failed = failures.len(), records = records.len(), "aggregate fetch complete");
        *self.merged.write() = records.clone().into();
        Ok(records)
    }

    /// Records of one source: fresh, freshly fetched, or stale if the fetch failed.
    pub async fn fetch_data_source(&self, id: SourceId) -> Result<Vec<MarketRecord>> {
        let source = self.registry.lookup(id)?;
        let records = self.cache.get_or_fetch(&source).await?;
        Ok(records.to_vec())
    }

    /// Merged view when `id` is `None`, else one source's cache. Never fetches.
    pub fn market_data_by_source(&self, id: Option<SourceId>) -> Vec<MarketRecord> {
        match id {
            None => self.merged.read().to_vec(),
            Some(id) => self.cache.records(id).map(|set| set.to_vec()).unwrap_or_default(),
        }
    }

    pub fn available_sources(&self) -> Vec<SourceId> {
        self.registry.list_ids()
    }

    pub fn source_name(&self, id: SourceId) -> String {
        self.registry.name(id)
    }

    pub fn source_status(&self, id: SourceId) -> SourceStatus {
        self.cache.status(id)
    }

    /// Scheduled reconciliation over every source, then a rebuild of the
    /// merged view from all per-source caches.
    pub async fn update_prices(&self) -> UpdateReport {
        let outcomes = join_all(self.registry.iter().map(|source| {
            let id = source.id();
            async move { (id, within(self.deadline, id, self.cache.reconcile(source)).await) }
        }))
        .await;

        let mut report = UpdateReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(Reconciled::Refreshed(_)) => report.refreshed.push(id),
                Ok(Reconciled::Unchanged(_)) => report.unchanged.push(id),
                Err(err) => {
                    warn!(source = %id, error = %err, "price update failed, cached records kept");
                    metrics::counter!("marketx_update_failures_total", "source" => id.as_str()).increment(1);
                    report.failed.push((id, err));
                }
            }
        }

        self.rebuild_view();
        report
    }

    fn rebuild_view(&self) {
        let sets: Vec<RecordSet> = self
            .registry
            .iter()
            .filter_map(|source| self.cache.records(source.id()))
            .collect();
        let view = union_view(sets.iter().map(|set| &set[..]));
        *self.merged.write() = view.into();
    }
}

/// Bound a per-source future by the fan-out deadline. Missing it counts as a
/// network failure for this pass only; the fetch itself keeps running.
async fn within<T, F>(deadline: Option<Duration>, id: SourceId, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(deadline) = deadline else {
        return fut.await;
    };
    match tokio::time::timeout(deadline, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(MarketDataError::Network {
            url: id.to_string(),
            message: format!("fan-out deadline of {deadline:?} exceeded"),
        }),
    }
}
