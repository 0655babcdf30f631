// Per-source TTL cache with single-flight fetches.
//
// Each source owns a `SourceSlot`. The slot mutex guards the published entry,
// the in-flight fetch and the last error; it is only held for pointer swaps,
// never across an `.await`. A fetch runs in its own task so it completes and
// writes back even when every waiter has given up on it. A merging fetch folds
// its snapshot into the entry inside that same write-back, so no reader ever
// sees the bare snapshot.

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::market_data::adapters::MarketSource;
use crate::market_data::error::{MarketDataError, Result};
use crate::market_data::reconcile::reconcile_records;
use crate::market_data::types::{RecordSet, SourceId};

type FetchOutcome = Result<RecordSet>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// How a finished fetch is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Snapshot replaces the entry wholesale.
    Replace,
    /// Snapshot is folded into the entry cached when the fetch started.
    Merge,
}

#[derive(Clone)]
struct InFlight {
    fetch: SharedFetch,
    mode: FetchMode,
}

/// Result of a scheduled refresh of one source.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// Entry was still fresh; nothing was fetched.
    Unchanged(RecordSet),
    /// A snapshot was fetched and merged into the entry.
    Refreshed(RecordSet),
}

impl Reconciled {
    pub fn records(&self) -> &RecordSet {
        match self {
            Reconciled::Unchanged(records) | Reconciled::Refreshed(records) => records,
        }
    }
}

/// Most recent successfully normalized set of one source.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub records: RecordSet,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Empty,
    Fetching,
    Fresh,
    Stale,
}

/// Point-in-time view of one source, for callers that want to know whether
/// the data they were served is current.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStatus {
    pub source: SourceId,
    pub state: EntryState,
    pub record_count: usize,
    pub age: Option<Duration>,
    pub last_error: Option<MarketDataError>,
}

#[derive(Default)]
struct SlotState {
    entry: Option<Arc<CacheEntry>>,
    in_flight: Option<InFlight>,
    last_error: Option<MarketDataError>,
}

#[derive(Default)]
struct SourceSlot {
    state: Mutex<SlotState>,
}

impl SourceSlot {
    fn entry(&self) -> Option<Arc<CacheEntry>> {
        self.state.lock().entry.clone()
    }

    fn fresh_entry(&self, ttl: Duration) -> Option<Arc<CacheEntry>> {
        self.entry().filter(|e| e.is_fresh(ttl))
    }
}

pub struct CacheStore {
    ttl: Duration,
    slots: RwLock<AHashMap<SourceId, Arc<SourceSlot>>>,
}

impl CacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(AHashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, id: SourceId) -> Arc<SourceSlot> {
        if let Some(slot) = self.slots.read().get(&id) {
            return slot.clone();
        }
        self.slots.write().entry(id).or_default().clone()
    }

    /// Fresh records, else a (shared) fetch; on fetch failure fall back to
    /// stale records when any exist.
    pub async fn get_or_fetch(&self, source: &Arc<dyn MarketSource>) -> Result<RecordSet> {
        let id = source.id();
        match self.load(source).await {
            Ok(records) => Ok(records),
            Err(err) => match self.slot(id).entry() {
                Some(stale) => {
                    warn!(source = %id, error = %err, age_ms = stale.age().as_millis() as u64, "fetch failed, serving stale records");
                    metrics::counter!("marketx_stale_served_total", "source" => id.as_str()).increment(1);
                    Ok(stale.records.clone())
                }
                None => Err(err),
            },
        }
    }

    /// Fresh records, else a (shared) fetch. No stale fallback.
    pub async fn load(&self, source: &Arc<dyn MarketSource>) -> Result<RecordSet> {
        let slot = self.slot(source.id());
        if let Some(entry) = slot.fresh_entry(self.ttl) {
            debug!(source = %source.id(), "cache hit");
            return Ok(entry.records.clone());
        }
        Self::fetch_shared(&slot, source, FetchMode::Replace).await.1
    }

    /// Scheduled refresh: fetch when the entry is not fresh and merge the new
    /// snapshot into the cached set, so records the exchange stopped reporting
    /// are kept. The merge happens in the fetch task, so it still lands when
    /// the caller gives up early. A failure leaves the entry untouched.
    pub async fn reconcile(&self, source: &Arc<dyn MarketSource>) -> Result<Reconciled> {
        let id = source.id();
        let slot = self.slot(id);
        if let Some(entry) = slot.fresh_entry(self.ttl) {
            return Ok(Reconciled::Unchanged(entry.records.clone()));
        }

        let previous = slot.entry();
        let (mode, published) = Self::fetch_shared(&slot, source, FetchMode::Merge).await;
        let published = published?;
        if mode == FetchMode::Merge {
            return Ok(Reconciled::Refreshed(published));
        }

        // joined a plain refetch, which replaced the entry; fold the old set back in
        let Some(previous) = previous else {
            return Ok(Reconciled::Refreshed(published));
        };
        let mut state = slot.state.lock();
        match state.entry.clone() {
            Some(current) if Arc::ptr_eq(&current.records, &published) => {
                let fetched_at = current.fetched_at;
                let merged: RecordSet = reconcile_records(&previous.records, &published).into();
                state.entry = Some(Arc::new(CacheEntry {
                    records: merged.clone(),
                    fetched_at,
                }));
                debug!(source = %id, previous = previous.records.len(), refreshed = published.len(), merged = merged.len(), "re-folded after shared refetch");
                Ok(Reconciled::Refreshed(merged))
            }
            // a newer entry was published meanwhile and wins as is
            Some(current) => Ok(Reconciled::Refreshed(current.records.clone())),
            None => Ok(Reconciled::Refreshed(published)),
        }
    }

    /// Cached records regardless of age. Never performs I/O.
    pub fn records(&self, id: SourceId) -> Option<RecordSet> {
        let slot = self.slots.read().get(&id).cloned()?;
        slot.entry().map(|e| e.records.clone())
    }

    pub fn state(&self, id: SourceId) -> EntryState {
        self.status(id).state
    }

    pub fn status(&self, id: SourceId) -> SourceStatus {
        let slot = self.slots.read().get(&id).cloned();
        let Some(slot) = slot else {
            return SourceStatus {
                source: id,
                state: EntryState::Empty,
                record_count: 0,
                age: None,
                last_error: None,
            };
        };
        let state = slot.state.lock();
        let entry_state = match (&state.in_flight, &state.entry) {
            (Some(_), _) => EntryState::Fetching,
            (None, Some(entry)) if entry.is_fresh(self.ttl) => EntryState::Fresh,
            (None, Some(_)) => EntryState::Stale,
            (None, None) => EntryState::Empty,
        };
        SourceStatus {
            source: id,
            state: entry_state,
            record_count: state.entry.as_ref().map_or(0, |e| e.records.len()),
            age: state.entry.as_ref().map(|e| e.age()),
            last_error: state.last_error.clone(),
        }
    }

    /// Join the fetch already running for this slot, or start one in `mode`.
    /// Returns the mode of the fetch actually awaited.
    async fn fetch_shared(
        slot: &Arc<SourceSlot>,
        source: &Arc<dyn MarketSource>,
        mode: FetchMode,
    ) -> (FetchMode, FetchOutcome) {
        let flight = {
            let mut state = slot.state.lock();
            match &state.in_flight {
                Some(flight) => {
                    debug!(source = %source.id(), mode = ?flight.mode, "joining in-flight fetch");
                    flight.clone()
                }
                None => {
                    let base = match mode {
                        FetchMode::Merge => state.entry.as_ref().map(|e| e.records.clone()),
                        FetchMode::Replace => None,
                    };
                    let flight = InFlight {
                        fetch: Self::launch(slot.clone(), source.clone(), base),
                        mode,
                    };
                    state.in_flight = Some(flight.clone());
                    flight
                }
            }
        };
        (flight.mode, flight.fetch.await)
    }

    /// Spawn the fetch. With a merge `base` the snapshot is reconciled into it
    /// before publication; without one it replaces the entry.
    fn launch(slot: Arc<SourceSlot>, source: Arc<dyn MarketSource>, base: Option<RecordSet>) -> SharedFetch {
        let id = source.id();
        let task_slot = slot.clone();
        let task = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = source.fetch_records().await;
            let elapsed = started.elapsed();
            metrics::histogram!("marketx_fetch_seconds", "source" => id.as_str()).record(elapsed.as_secs_f64());

            let mut state = task_slot.state.lock();
            state.in_flight = None;
            match outcome {
                Ok(records) => {
                    let fetched = records.len();
                    let records: RecordSet = match &base {
                        Some(base) => reconcile_records(base, &records).into(),
                        None => records.into(),
                    };
                    info!(source = %id, fetched, published = records.len(), merged = base.is_some(), elapsed_ms = elapsed.as_millis() as u64, "fetched");
                    metrics::counter!("marketx_fetch_total", "source" => id.as_str(), "outcome" => "ok").increment(1);
                    state.entry = Some(Arc::new(CacheEntry {
                        records: records.clone(),
                        fetched_at: Instant::now(),
                    }));
                    state.last_error = None;
                    Ok(records)
                }
                Err(err) => {
                    warn!(source = %id, error = %err, "fetch failed");
                    metrics::counter!("marketx_fetch_total", "source" => id.as_str(), "outcome" => "error").increment(1);
                    state.last_error = Some(err.clone());
                    Err(err)
                }
            }
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    // the task never reached its write-back
                    slot.state.lock().in_flight = None;
                    Err(MarketDataError::TaskAborted {
                        source_id: id,
                        reason: join_err.to_string(),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }
}
