use ahash::{AHashMap, AHashSet};

use crate::market_data::types::{MarketRecord, RecordKey};

/// Merge a refreshed snapshot into the previously cached set of one source.
///
/// - keys present in both: the refreshed record wins, except that a display
///   name which is only the symbol fallback keeps the earlier, richer name;
/// - keys only in `previous`: retained unchanged, original order;
/// - keys only in `refreshed`: appended in snapshot order.
///
/// Merging a snapshot with itself returns it unchanged.
pub fn reconcile_records(previous: &[MarketRecord], refreshed: &[MarketRecord]) -> Vec<MarketRecord> {
    let by_key: AHashMap<RecordKey<'_>, &MarketRecord> =
        refreshed.iter().map(|r| (r.key(), r)).collect();

    let mut merged = Vec::with_capacity(previous.len().max(refreshed.len()));
    let mut seen: AHashSet<RecordKey<'_>> = AHashSet::with_capacity(previous.len());

    for old in previous {
        seen.insert(old.key());
        match by_key.get(&old.key()) {
            Some(new) => merged.push(merge_one(old, new)),
            None => merged.push(old.clone()),
        }
    }
    for new in refreshed {
        if !seen.contains(&new.key()) {
            merged.push(new.clone());
        }
    }
    merged
}

fn merge_one(old: &MarketRecord, new: &MarketRecord) -> MarketRecord {
    let mut out = new.clone();
    if new.display_name == new.symbol && old.display_name != old.symbol {
        out.display_name = old.display_name.clone();
    }
    out
}

/// Concatenate per-source sets into one view, keeping source order.
pub fn union_view<'a>(sets: impl IntoIterator<Item = &'a [MarketRecord]>) -> Vec<MarketRecord> {
    sets.into_iter().flat_map(|set| set.iter().cloned()).collect()
}
