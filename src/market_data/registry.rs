use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use crate::market_data::adapters::MarketSource;
use crate::market_data::error::{MarketDataError, Result};
use crate::market_data::types::SourceId;

/// Registered sources keyed by id, iterated in registration order.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    order: Vec<SourceId>,
    sources: AHashMap<SourceId, Arc<dyn MarketSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering an id replaces the adapter and keeps its original position.
    pub fn register(&mut self, source: Arc<dyn MarketSource>) {
        let id = source.id();
        if self.sources.insert(id, source).is_some() {
            debug!(source = %id, "replaced registered source");
        } else {
            self.order.push(id);
            debug!(source = %id, "registered source");
        }
    }

    pub fn lookup(&self, id: SourceId) -> Result<Arc<dyn MarketSource>> {
        self.sources
            .get(&id)
            .cloned()
            .ok_or(MarketDataError::SourceNotFound(id))
    }

    pub fn list_ids(&self) -> Vec<SourceId> {
        self.order.clone()
    }

    /// Registered sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MarketSource>> + '_ {
        self.order.iter().filter_map(|id| self.sources.get(id))
    }

    /// Human name of a source; the id's display name when unregistered.
    pub fn name(&self, id: SourceId) -> String {
        self.sources
            .get(&id)
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| id.display_name().to_string())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
