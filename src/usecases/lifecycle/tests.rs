use super::*;
use crate::adapters::mock::{FixedConfirmation, RecordingAuditLog, ScriptedConflictCheck};
use crate::adapters::persistence::LocalSlotStore;
use crate::domain::{
    InventoryStatus, Lesson, SlotDay, SlotType, StatusChange, Weekday, WeeklySlotDraft,
    WeeklyStatus,
};
use crate::ports::ConflictCheckPort;
use chrono::NaiveDate;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const DAY: &str = "2024-05-07";

struct Harness {
    manager: Arc<SlotLifecycleManager>,
    store: Arc<LocalSlotStore>,
    confirm: Arc<FixedConfirmation>,
    audit_rx: UnboundedReceiver<OverrideAuditEntry>,
}

/// Local store as both record store and conflict checker.
fn harness() -> Harness {
    let store = Arc::new(LocalSlotStore::in_memory());
    build(Arc::clone(&store), store.clone(), FixedConfirmation::yes(), false)
}

fn harness_with(checker: Arc<dyn ConflictCheckPort>, confirm: FixedConfirmation) -> Harness {
    build(Arc::new(LocalSlotStore::in_memory()), checker, confirm, false)
}

fn build(
    store: Arc<LocalSlotStore>,
    checker: Arc<dyn ConflictCheckPort>,
    confirm: FixedConfirmation,
    failing_audit: bool,
) -> Harness {
    let (audit, audit_rx) = if failing_audit {
        RecordingAuditLog::failing()
    } else {
        RecordingAuditLog::channel()
    };
    let confirm = Arc::new(confirm);
    let manager = SlotLifecycleManager::new(
        store.clone(),
        ConflictResolver::new(checker),
        Arc::new(audit),
        confirm.clone(),
        LifecyclePolicy::default(),
    );
    Harness {
        manager: Arc::new(manager),
        store,
        confirm,
        audit_rx,
    }
}

fn lesson(id: &str, start: &str, minutes: u32) -> Lesson {
    Lesson {
        id: id.into(),
        teacher_id: "t1".into(),
        student_id: Some("s1".into()),
        student_name: Some("Dana".into()),
        date: DAY.into(),
        start_time: start.into(),
        duration_minutes: minutes,
        slot_id: None,
    }
}

fn draft(start: &str, end: &str) -> InventoryDraft {
    InventoryDraft::open("t1", DAY, start, end)
}

fn weekly(day: Weekday, start: &str, end: &str) -> WeeklySlotDraft {
    WeeklySlotDraft {
        teacher_id: "t1".into(),
        day_of_week: SlotDay::Known(day),
        start_time: start.into(),
        end_time: end.into(),
        slot_type: SlotType::Private,
        is_fixed: false,
        reserved_for_ids: vec![],
        status: WeeklyStatus::Active,
    }
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

async fn stored_inventory(store: &LocalSlotStore) -> Vec<SlotInventory> {
    store
        .list_inventory(&DateRange::new(may(1), may(31)))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_lesson_overlap_refuses_save() {
    let h = harness();
    h.store.add_lesson(lesson("l1", "10:30", 30)).await.unwrap();

    let err = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap_err();
    let report = match err {
        DomainError::BlockingConflict(report) => report,
        other => panic!("expected blocking conflict, got {:?}", other),
    };
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].record_id, "l1");
    assert_eq!(report.items[0].student_name(), Some("Dana"));
    assert!(stored_inventory(&h.store).await.is_empty());
    assert!(h.manager.snapshot().inventory.is_empty());
}

#[tokio::test]
async fn test_slot_overlap_is_saved_and_audited() {
    let mut h = harness();
    let first = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    assert!(first.overridden.is_empty());

    let second = h.manager.create_inventory(draft("10:30", "11:30")).await.unwrap();
    // Reported by both the local pass and the store; kept once.
    assert_eq!(second.overridden.len(), 1);
    assert_eq!(second.overridden[0].record_id, first.record.id);
    assert_eq!(h.manager.snapshot().inventory.len(), 2);

    let entry = tokio::time::timeout(Duration::from_secs(1), h.audit_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.record_id, second.record.id);
    assert_eq!(entry.teacher_id, "t1");
    assert!(entry.conflict_summary.starts_with("1 advisory"));
}

#[tokio::test]
async fn test_failed_audit_does_not_fail_save() {
    let store = Arc::new(LocalSlotStore::in_memory());
    let mut h = build(Arc::clone(&store), store.clone(), FixedConfirmation::yes(), true);
    h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let saved = h.manager.create_inventory(draft("10:30", "11:30")).await.unwrap();
    assert_eq!(saved.overridden.len(), 1);
    // Sink was reached and failed; the save stands.
    assert!(h.audit_rx.recv().await.is_some());
    assert_eq!(stored_inventory(&h.store).await.len(), 2);
}

#[tokio::test]
async fn test_failed_check_fails_open() {
    let mut h = harness_with(
        Arc::new(ScriptedConflictCheck::failing("503 Service Unavailable")),
        FixedConfirmation::yes(),
    );
    h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();

    let saved = h.manager.create_inventory(draft("10:30", "11:30")).await.unwrap();
    assert!(saved.check_skipped);
    assert!(saved.overridden.is_empty());
    assert_eq!(h.manager.snapshot().inventory.len(), 2);
    assert!(h.audit_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_store_still_refuses_when_check_fails() {
    let store = Arc::new(LocalSlotStore::in_memory());
    store.add_lesson(lesson("l1", "10:30", 30)).await.unwrap();
    let checker = Arc::new(ScriptedConflictCheck::failing("timeout"));
    let h = build(Arc::clone(&store), checker, FixedConfirmation::yes(), false);

    let err = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap_err();
    assert!(matches!(err, DomainError::WriteConflict(ref r) if r.items.len() == 1));
    assert!(h.manager.snapshot().inventory.is_empty());
}

#[tokio::test]
async fn test_validation_runs_before_any_io() {
    let checker = Arc::new(ScriptedConflictCheck::with_conflicts(vec![]));
    let h = harness_with(checker.clone(), FixedConfirmation::yes());

    for bad in [
        draft("11:00", "10:00"),
        draft("10:00", "10:00"),
        draft("", "10:00"),
        InventoryDraft::open("", DAY, "10:00", "11:00"),
        InventoryDraft::open("t1", "07/05/2024", "10:00", "11:00"),
    ] {
        let err = h.manager.create_inventory(bad).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "{:?}", err);
    }
    let mut booked = draft("10:00", "11:00");
    booked.status = InventoryStatus::Booked;
    assert!(matches!(
        h.manager.create_inventory(booked).await,
        Err(DomainError::Validation(_))
    ));
    assert_eq!(checker.request_count(), 0);
    assert!(stored_inventory(&h.store).await.is_empty());
}

#[tokio::test]
async fn test_edit_keeps_status_and_excludes_self() {
    let checker = Arc::new(ScriptedConflictCheck::with_conflicts(vec![]));
    let h = harness_with(checker.clone(), FixedConfirmation::yes());
    let created = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let id = created.record.id.clone();
    h.manager.block(&id).await.unwrap();

    let edit = InventoryEdit {
        start_time: "10:15".into(),
        end_time: "11:15".into(),
        ..InventoryEdit::from(&created.record)
    };
    let saved = h.manager.update_inventory(&id, edit).await.unwrap();
    assert_eq!(saved.record.status, InventoryStatus::Blocked);
    assert_eq!(saved.record.start_time, "10:15");
    // The record's old self is not a sibling.
    assert!(saved.overridden.is_empty());
    assert_eq!(checker.last_request().and_then(|r| r.record_id), Some(id));
}

#[tokio::test]
async fn test_edit_of_canceled_slot_is_refused() {
    let h = harness();
    let created = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    h.manager.cancel(&created.record.id).await.unwrap();

    let err = h
        .manager
        .update_inventory(&created.record.id, InventoryEdit::from(&created.record))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_stale_version_is_reported() {
    let h = harness();
    let created = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let id = created.record.id.clone();
    // Someone else blocks it behind our back.
    h.store
        .transition_inventory(
            &id,
            &StatusChange {
                status: InventoryStatus::Blocked,
                student_id: None,
            },
        )
        .await
        .unwrap();

    let err = h
        .manager
        .update_inventory(&id, InventoryEdit::from(&created.record))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::StaleRecord { ref record_id } if *record_id == id));
}

#[tokio::test]
async fn test_reserve_requires_student() {
    let h = harness();
    let created = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let id = created.record.id;

    for student in [None, Some("  ")] {
        assert!(matches!(
            h.manager.reserve(&id, student).await,
            Err(DomainError::Validation(_))
        ));
    }

    let booked = h.manager.reserve(&id, Some("s1")).await.unwrap();
    assert_eq!(booked.status, InventoryStatus::Booked);
    assert_eq!(booked.student_id.as_deref(), Some("s1"));
    assert_eq!(booked.lessons.len(), 1);
    assert!(h.manager.snapshot().open_inventory().is_empty());
    assert!(!h.manager.snapshot().is_pending(&id));
    assert_eq!(h.store.lessons().await.len(), 1);
}

#[tokio::test]
async fn test_reserve_without_student_when_policy_allows() {
    let store = Arc::new(LocalSlotStore::in_memory());
    let manager = SlotLifecycleManager::new(
        store.clone(),
        ConflictResolver::new(store.clone()),
        Arc::new(RecordingAuditLog::channel().0),
        Arc::new(FixedConfirmation::yes()),
        LifecyclePolicy {
            require_student: false,
        },
    );
    let created = manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let booked = manager.reserve(&created.record.id, None).await.unwrap();
    assert_eq!(booked.status, InventoryStatus::Booked);
    assert_eq!(booked.student_id, None);
}

#[tokio::test]
async fn test_failed_reservation_restores_slot() {
    let h = harness();
    let created = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let id = created.record.id;
    h.store.delete_inventory(&id).await.unwrap();

    let err = h.manager.reserve(&id, Some("s1")).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
    let snap = h.manager.snapshot();
    assert!(!snap.is_pending(&id));
    assert_eq!(snap.open_inventory().len(), 1);
    assert_eq!(
        snap.inventory_by_id(&id).map(|r| r.status),
        Some(InventoryStatus::Open)
    );
}

#[tokio::test]
async fn test_block_and_unblock_need_no_confirmation() {
    let h = harness_with(
        Arc::new(ScriptedConflictCheck::with_conflicts(vec![])),
        FixedConfirmation::no(),
    );
    let created = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let id = created.record.id;

    let blocked = h.manager.block(&id).await.unwrap();
    assert_eq!(blocked.status, InventoryStatus::Blocked);
    assert!(matches!(
        h.manager.block(&id).await,
        Err(DomainError::InvalidTransition { .. })
    ));
    let reopened = h.manager.unblock(&id).await.unwrap();
    assert_eq!(reopened.status, InventoryStatus::Open);
    assert!(h.confirm.prompts().is_empty());
}

#[tokio::test]
async fn test_declined_cancel_and_delete_change_nothing() {
    let h = harness_with(
        Arc::new(ScriptedConflictCheck::with_conflicts(vec![])),
        FixedConfirmation::no(),
    );
    let created = h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let id = created.record.id;

    assert!(matches!(h.manager.cancel(&id).await, Err(DomainError::Declined)));
    assert!(matches!(
        h.manager.delete_inventory(&id).await,
        Err(DomainError::Declined)
    ));
    let prompts = h.confirm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts.iter().all(|p| p.danger));
    // Only the hard delete claims to be irreversible.
    assert_eq!(
        prompts[0].help.as_deref(),
        Some("It stays in history but can no longer be booked")
    );
    assert_eq!(prompts[1].help.as_deref(), Some("This cannot be undone"));
    let stored = stored_inventory(&h.store).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, InventoryStatus::Open);
}

#[tokio::test]
async fn test_confirmed_cancel_and_delete() {
    let h = harness();
    let a = h.manager.create_inventory(draft("09:00", "10:00")).await.unwrap().record;
    let b = h.manager.create_inventory(draft("12:00", "13:00")).await.unwrap().record;

    let canceled = h.manager.cancel(&a.id).await.unwrap();
    assert_eq!(canceled.status, InventoryStatus::Canceled);
    h.manager.delete_inventory(&b.id).await.unwrap();

    let snap = h.manager.snapshot();
    assert!(snap.inventory_by_id(&b.id).is_none());
    assert_eq!(
        snap.inventory_by_id(&a.id).map(|r| r.status),
        Some(InventoryStatus::Canceled)
    );
}

#[tokio::test]
async fn test_closed_session_discards_pending_save() {
    let checker = Arc::new(ScriptedConflictCheck::with_conflicts(vec![]).with_delay_ms(200));
    let h = harness_with(checker, FixedConfirmation::yes());
    h.manager.open_session(None);

    let manager = Arc::clone(&h.manager);
    let pending = tokio::spawn(async move { manager.create_inventory(draft("10:00", "11:00")).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.manager.close_session();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(DomainError::Superseded)));
    assert!(stored_inventory(&h.store).await.is_empty());
    assert!(h.manager.snapshot().inventory.is_empty());
}

/// Local store whose creates take a while to come back.
struct SlowCreateStore {
    inner: Arc<LocalSlotStore>,
    delay: Duration,
}

#[async_trait::async_trait]
impl SlotStorePort for SlowCreateStore {
    async fn list_weekly(&self) -> Result<Vec<WeeklySlot>, DomainError> {
        self.inner.list_weekly().await
    }
    async fn create_weekly(&self, d: &WeeklySlotDraft) -> Result<WeeklySlot, DomainError> {
        self.inner.create_weekly(d).await
    }
    async fn update_weekly(&self, id: &str, d: &WeeklySlotDraft) -> Result<WeeklySlot, DomainError> {
        self.inner.update_weekly(id, d).await
    }
    async fn set_weekly_status(&self, id: &str, s: WeeklyStatus) -> Result<WeeklySlot, DomainError> {
        self.inner.set_weekly_status(id, s).await
    }
    async fn delete_weekly(&self, id: &str) -> Result<(), DomainError> {
        self.inner.delete_weekly(id).await
    }
    async fn list_inventory(&self, range: &DateRange) -> Result<Vec<SlotInventory>, DomainError> {
        self.inner.list_inventory(range).await
    }
    async fn create_inventory(&self, d: &InventoryDraft) -> Result<SlotInventory, DomainError> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_inventory(d).await
    }
    async fn update_inventory(
        &self,
        id: &str,
        u: &crate::domain::InventoryUpdate,
    ) -> Result<SlotInventory, DomainError> {
        self.inner.update_inventory(id, u).await
    }
    async fn transition_inventory(&self, id: &str, c: &StatusChange) -> Result<SlotInventory, DomainError> {
        self.inner.transition_inventory(id, c).await
    }
    async fn delete_inventory(&self, id: &str) -> Result<(), DomainError> {
        self.inner.delete_inventory(id).await
    }
}

#[tokio::test]
async fn test_session_closed_during_commit_drops_result_but_audits() {
    let inner = Arc::new(LocalSlotStore::in_memory());
    inner.create_inventory(&draft("10:00", "11:00")).await.unwrap();
    let store = Arc::new(SlowCreateStore {
        inner: Arc::clone(&inner),
        delay: Duration::from_millis(200),
    });
    let (audit, mut audit_rx) = RecordingAuditLog::channel();
    let manager = Arc::new(SlotLifecycleManager::new(
        store,
        ConflictResolver::new(inner.clone()),
        Arc::new(audit),
        Arc::new(FixedConfirmation::yes()),
        LifecyclePolicy::default(),
    ));
    manager.open_session(None);

    let m = Arc::clone(&manager);
    let pending = tokio::spawn(async move { m.create_inventory(draft("10:30", "11:30")).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.close_session();
    manager.open_session(Some("other-record"));

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(DomainError::Superseded)));
    // The write went through; the new form never sees it.
    assert_eq!(stored_inventory(&inner).await.len(), 2);
    assert!(manager.snapshot().inventory.is_empty());
    let entry = tokio::time::timeout(Duration::from_secs(1), audit_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.teacher_id, "t1");
    assert!(entry.conflict_summary.starts_with("1 advisory"));
}

#[tokio::test]
async fn test_double_submit_is_busy() {
    let checker = Arc::new(ScriptedConflictCheck::with_conflicts(vec![]).with_delay_ms(200));
    let h = harness_with(checker.clone(), FixedConfirmation::yes());

    let manager = Arc::clone(&h.manager);
    let first = tokio::spawn(async move { manager.create_inventory(draft("10:00", "11:00")).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.manager.is_busy());

    let second = h.manager.create_inventory(draft("10:00", "11:00")).await;
    assert!(matches!(second, Err(DomainError::Busy(_))));
    assert!(first.await.unwrap().is_ok());
    assert_eq!(checker.request_count(), 1);
    assert!(!h.manager.is_busy());
}

/// Store that returns every inventory record twice, the second copy with a changed status.
struct DuplicatingStore(LocalSlotStore);

#[async_trait::async_trait]
impl SlotStorePort for DuplicatingStore {
    async fn list_weekly(&self) -> Result<Vec<WeeklySlot>, DomainError> {
        self.0.list_weekly().await
    }
    async fn create_weekly(&self, d: &WeeklySlotDraft) -> Result<WeeklySlot, DomainError> {
        self.0.create_weekly(d).await
    }
    async fn update_weekly(&self, id: &str, d: &WeeklySlotDraft) -> Result<WeeklySlot, DomainError> {
        self.0.update_weekly(id, d).await
    }
    async fn set_weekly_status(&self, id: &str, s: WeeklyStatus) -> Result<WeeklySlot, DomainError> {
        self.0.set_weekly_status(id, s).await
    }
    async fn delete_weekly(&self, id: &str) -> Result<(), DomainError> {
        self.0.delete_weekly(id).await
    }
    async fn list_inventory(&self, range: &DateRange) -> Result<Vec<SlotInventory>, DomainError> {
        let records = self.0.list_inventory(range).await?;
        let copies = records.iter().cloned().map(|mut r| {
            r.status = InventoryStatus::Blocked;
            r
        });
        Ok(records.clone().into_iter().chain(copies).collect())
    }
    async fn create_inventory(&self, d: &InventoryDraft) -> Result<SlotInventory, DomainError> {
        self.0.create_inventory(d).await
    }
    async fn update_inventory(
        &self,
        id: &str,
        u: &crate::domain::InventoryUpdate,
    ) -> Result<SlotInventory, DomainError> {
        self.0.update_inventory(id, u).await
    }
    async fn transition_inventory(&self, id: &str, c: &StatusChange) -> Result<SlotInventory, DomainError> {
        self.0.transition_inventory(id, c).await
    }
    async fn delete_inventory(&self, id: &str) -> Result<(), DomainError> {
        self.0.delete_inventory(id).await
    }
}

#[tokio::test]
async fn test_refresh_drops_duplicate_records() {
    let store = Arc::new(DuplicatingStore(LocalSlotStore::in_memory()));
    store.0.create_inventory(&draft("10:00", "11:00")).await.unwrap();
    store.0.create_inventory(&draft("12:00", "13:00")).await.unwrap();
    store.0.create_weekly(&weekly(Weekday::Monday, "16:00", "17:00")).await.unwrap();
    let manager = SlotLifecycleManager::new(
        store,
        ConflictResolver::new(Arc::new(ScriptedConflictCheck::with_conflicts(vec![]))),
        Arc::new(RecordingAuditLog::channel().0),
        Arc::new(FixedConfirmation::yes()),
        LifecyclePolicy::default(),
    );

    let report = manager.refresh(&DateRange::new(may(1), may(31))).await.unwrap();
    assert_eq!(
        report,
        RefreshReport {
            weekly: 1,
            inventory: 2,
            duplicates_dropped: 2,
        }
    );
    let snap = manager.snapshot();
    assert_eq!(snap.inventory.len(), 2);
    // First copy wins.
    assert!(snap.inventory.iter().all(|r| r.status == InventoryStatus::Open));
    assert_eq!(snap.inventory[0].start_time, "10:00");

    let again = manager.refresh(&DateRange::new(may(1), may(31))).await.unwrap();
    assert_eq!(again, report);
}

#[tokio::test]
async fn test_materialize_range_skips_covered_and_refused_dates() {
    let h = harness();
    h.manager
        .create_weekly(weekly(Weekday::Tuesday, "10:00", "11:00"))
        .await
        .unwrap();
    // Second Tuesday is taken by a lesson; the store refuses that draft.
    let mut taken = lesson("l1", "10:30", 30);
    taken.date = "2024-05-14".into();
    h.store.add_lesson(taken).await.unwrap();

    let range = DateRange::new(may(6), may(19));
    let report = h.manager.materialize_range(&range).await.unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].date, DAY);
    assert!(report.created[0].weekly_slot_id.is_some());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0.date, "2024-05-14");

    let rerun = h.manager.materialize_range(&range).await.unwrap();
    assert!(rerun.created.is_empty());
    assert_eq!(stored_inventory(&h.store).await.len(), 1);
    assert_eq!(h.manager.snapshot().inventory.len(), 1);
}

#[tokio::test]
async fn test_weekly_overlaps_are_advisory() {
    let h = harness();
    let a = h
        .manager
        .create_weekly(weekly(Weekday::Monday, "16:00", "17:00"))
        .await
        .unwrap();
    assert!(a.overlaps.is_empty());

    let b = h
        .manager
        .create_weekly(weekly(Weekday::Monday, "16:30", "17:30"))
        .await
        .unwrap();
    assert_eq!(b.overlaps.len(), 1);
    assert_eq!(b.overlaps[0].slot_id, a.slot.id);
    assert_eq!(h.manager.snapshot().weekly.len(), 2);

    // Touching boundaries do not overlap.
    let c = weekly(Weekday::Monday, "17:30", "18:00");
    assert!(h.manager.weekly_overlaps(&c, None).is_empty());

    let paused = h.manager.toggle_weekly(&a.slot.id).await.unwrap();
    assert_eq!(paused.status, WeeklyStatus::Paused);
    let b_draft = WeeklySlotDraft::from(&b.slot);
    assert!(h.manager.weekly_overlaps(&b_draft, Some(&b.slot.id)).is_empty());
    assert!(h.confirm.prompts().is_empty());
}

#[tokio::test]
async fn test_weekly_validation_and_delete() {
    let h = harness();
    let mut bad = weekly(Weekday::Friday, "10:00", "11:00");
    bad.teacher_id = " ".into();
    assert!(matches!(
        h.manager.create_weekly(bad).await,
        Err(DomainError::Validation(_))
    ));

    let saved = h
        .manager
        .create_weekly(weekly(Weekday::Friday, "10:00", "11:00"))
        .await
        .unwrap();
    let mut edit = WeeklySlotDraft::from(&saved.slot);
    edit.end_time = "11:30".into();
    let updated = h.manager.update_weekly(&saved.slot.id, edit).await.unwrap();
    assert_eq!(updated.slot.end_time, "11:30");

    h.manager.delete_weekly(&saved.slot.id).await.unwrap();
    assert!(h.manager.snapshot().weekly.is_empty());
    assert_eq!(h.confirm.prompts().len(), 1);
    assert!(matches!(
        h.manager.toggle_weekly(&saved.slot.id).await,
        Err(DomainError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_recent_overrides_newest_first() {
    let mut h = harness();
    h.manager.create_inventory(draft("10:00", "11:00")).await.unwrap();
    let second = h.manager.create_inventory(draft("10:30", "11:30")).await.unwrap();
    let third = h.manager.create_inventory(draft("10:45", "11:45")).await.unwrap();
    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(1), h.audit_rx.recv())
            .await
            .unwrap();
    }
    let recent = h.manager.recent_overrides(10).await.unwrap();
    assert_eq!(recent.len(), 2);
    let ids: Vec<_> = recent.iter().map(|e| e.record_id.clone()).collect();
    assert!(ids.contains(&second.record.id) && ids.contains(&third.record.id));
}
