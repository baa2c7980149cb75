//! Collection reconciler. Dedup and deterministic ordering of fetched records.
//!
//! Upstream joins can return the same record more than once. The first copy wins;
//! later copies are dropped and reported so a differing duplicate is never lost silently.

use super::entities::{SlotInventory, WeeklySlot};
use std::collections::HashSet;
use std::fmt::Debug;
use tracing::warn;

/// A record the reconciler can dedup and order.
pub trait Reconcilable: Clone + PartialEq + Debug {
    fn record_id(&self) -> &str;

    /// Primary and secondary sort keys. Missing values are empty strings and sort first.
    fn sort_key(&self) -> (String, String);
}

impl Reconcilable for SlotInventory {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> (String, String) {
        (self.date.clone(), self.start_time.clone())
    }
}

impl Reconcilable for WeeklySlot {
    fn record_id(&self) -> &str {
        &self.id
    }

    /// Normalized day first so `"7"` and `"Saturday"` group together. Unknown days sort first.
    fn sort_key(&self) -> (String, String) {
        let day = self
            .day_of_week
            .known()
            .map(|d| d.index().to_string())
            .unwrap_or_default();
        (day, self.start_time.clone())
    }
}

/// A duplicate dropped during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedDuplicate {
    pub record_id: String,
    /// The dropped copy carried different field values than the kept one.
    pub fields_differ: bool,
}

/// Result of reconciling one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub records: Vec<T>,
    pub dropped: Vec<DroppedDuplicate>,
}

/// Dedup by id (first wins) then stable-sort by `sort_key`.
pub fn reconcile<T: Reconcilable>(raw: Vec<T>) -> Reconciled<T> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut records: Vec<T> = Vec::with_capacity(raw.len());
    let mut dropped = Vec::new();

    for rec in raw {
        if seen.insert(rec.record_id().to_string()) {
            records.push(rec);
            continue;
        }
        let fields_differ = records
            .iter()
            .find(|kept| kept.record_id() == rec.record_id())
            .is_some_and(|kept| *kept != rec);
        warn!(
            record_id = %rec.record_id(),
            fields_differ,
            "duplicate record dropped during reconcile"
        );
        dropped.push(DroppedDuplicate {
            record_id: rec.record_id().to_string(),
            fields_differ,
        });
    }

    records.sort_by_cached_key(|r| r.sort_key());
    Reconciled { records, dropped }
}
