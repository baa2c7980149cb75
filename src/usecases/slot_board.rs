//! In-memory working set of slots.
//!
//! Readers take an `Arc<BoardSnapshot>` and never see a half-applied change: every
//! mutation clones the current snapshot, edits the copy and swaps it in whole.

use crate::domain::reconcile::reconcile;
use crate::domain::{InventoryStatus, SlotInventory, WeeklySlot};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub weekly: Vec<WeeklySlot>,
    pub inventory: Vec<SlotInventory>,
    /// Records with a reservation awaiting store confirmation, keyed by id. Value is the
    /// record as it was before the reservation.
    pub pending: HashMap<String, SlotInventory>,
}

impl BoardSnapshot {
    pub fn weekly_by_id(&self, id: &str) -> Option<&WeeklySlot> {
        self.weekly.iter().find(|s| s.id == id)
    }

    pub fn inventory_by_id(&self, id: &str) -> Option<&SlotInventory> {
        self.inventory.iter().find(|s| s.id == id)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Bookable records: `open` and not held by a pending reservation.
    pub fn open_inventory(&self) -> Vec<&SlotInventory> {
        self.inventory
            .iter()
            .filter(|s| s.status == InventoryStatus::Open && !self.is_pending(&s.id))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct SlotBoard {
    state: RwLock<Arc<BoardSnapshot>>,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        Arc::clone(&self.state.read().unwrap_or_else(|e| e.into_inner()))
    }

    fn apply(&self, f: impl FnOnce(&mut BoardSnapshot)) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        let mut next = BoardSnapshot::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    /// Replace both collections. Inputs are expected to be reconciled already.
    pub fn replace(&self, weekly: Vec<WeeklySlot>, inventory: Vec<SlotInventory>) {
        self.apply(|s| {
            s.weekly = weekly;
            s.inventory = inventory;
            s.pending.clear();
        });
    }

    pub fn upsert_weekly(&self, slot: WeeklySlot) {
        self.apply(|s| {
            let mut next: Vec<WeeklySlot> = std::mem::take(&mut s.weekly);
            next.retain(|w| w.id != slot.id);
            next.push(slot);
            s.weekly = reconcile(next).records;
        });
    }

    pub fn remove_weekly(&self, id: &str) {
        self.apply(|s| s.weekly.retain(|w| w.id != id));
    }

    pub fn upsert_inventory(&self, record: SlotInventory) {
        self.apply(|s| upsert_inventory_in(s, record));
    }

    pub fn extend_inventory(&self, records: Vec<SlotInventory>) {
        self.apply(|s| {
            for record in records {
                upsert_inventory_in(s, record);
            }
        });
    }

    pub fn remove_inventory(&self, id: &str) {
        self.apply(|s| {
            s.inventory.retain(|r| r.id != id);
            s.pending.remove(id);
        });
    }

    /// Hold `id` out of the open set until confirmed or rolled back. Returns the record
    /// as it was, or `None` if it is not on the board.
    pub fn begin_pending(&self, id: &str) -> Option<SlotInventory> {
        let original = self.snapshot().inventory_by_id(id).cloned()?;
        let held = original.clone();
        self.apply(|s| {
            s.pending.insert(id.to_string(), held);
        });
        Some(original)
    }

    /// Replace the provisional record with the store-confirmed one.
    pub fn confirm_pending(&self, confirmed: SlotInventory) {
        self.apply(|s| {
            s.pending.remove(&confirmed.id);
            upsert_inventory_in(s, confirmed);
        });
    }

    /// Drop the provisional state. The record reappears in the open set unchanged.
    pub fn rollback_pending(&self, id: &str) {
        self.apply(|s| {
            if let Some(original) = s.pending.remove(id) {
                upsert_inventory_in(s, original);
            }
        });
    }
}

fn upsert_inventory_in(s: &mut BoardSnapshot, record: SlotInventory) {
    let mut next: Vec<SlotInventory> = std::mem::take(&mut s.inventory);
    next.retain(|r| r.id != record.id);
    next.push(record);
    s.inventory = reconcile(next).records;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv(id: &str, date: &str, start: &str) -> SlotInventory {
        SlotInventory {
            id: id.into(),
            teacher_id: "t1".into(),
            date: date.into(),
            start_time: start.into(),
            end_time: "23:00".into(),
            status: InventoryStatus::Open,
            lessons: vec![],
            student_id: None,
            weekly_slot_id: None,
            version: None,
        }
    }

    #[test]
    fn test_old_snapshot_unchanged_after_mutation() {
        let board = SlotBoard::new();
        board.replace(vec![], vec![inv("a", "2024-05-07", "10:00")]);
        let before = board.snapshot();
        board.upsert_inventory(inv("b", "2024-05-06", "10:00"));
        assert_eq!(before.inventory.len(), 1);
        let after = board.snapshot();
        let ids: Vec<_> = after.inventory.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_pending_is_hidden_from_open_set() {
        let board = SlotBoard::new();
        board.replace(vec![], vec![inv("a", "2024-05-07", "10:00")]);
        assert!(board.begin_pending("a").is_some());
        assert!(board.snapshot().open_inventory().is_empty());
        board.rollback_pending("a");
        let snap = board.snapshot();
        assert_eq!(snap.open_inventory().len(), 1);
        assert!(snap.pending.is_empty());
    }

    #[test]
    fn test_confirm_replaces_with_store_record() {
        let board = SlotBoard::new();
        board.replace(vec![], vec![inv("a", "2024-05-07", "10:00")]);
        board.begin_pending("a");
        let mut booked = inv("a", "2024-05-07", "10:00");
        booked.status = InventoryStatus::Booked;
        board.confirm_pending(booked);
        let snap = board.snapshot();
        assert_eq!(snap.inventory_by_id("a").map(|r| r.status), Some(InventoryStatus::Booked));
        assert!(!snap.is_pending("a"));
    }

    #[test]
    fn test_begin_pending_unknown_record() {
        let board = SlotBoard::new();
        assert!(board.begin_pending("missing").is_none());
    }
}
