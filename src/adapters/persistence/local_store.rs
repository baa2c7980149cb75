//! Local record store. Implements SlotStorePort and ConflictCheckPort over one JSON file.
//!
//! Used when no remote store is configured, and in memory (no file) for tests. Holds
//! lessons as well as slots so it can answer conflict checks and re-enforce the
//! no-double-booking rule at commit time, the same way the remote store does.

use crate::domain::entities::parse_date;
use crate::domain::overlap::{TimeRange, format_instant};
use crate::domain::temporal::parse_time_to_minutes;
use crate::domain::{
    ConflictCheckRequest, ConflictCheckResponse, ConflictItem, ConflictReport, ConflictSource,
    DateRange, DomainError, InventoryDraft, InventoryStatus, InventoryUpdate, Lesson,
    SlotInventory, StatusChange, WeeklySlot, WeeklySlotDraft, WeeklyStatus,
};
use crate::ports::{ConflictCheckPort, SlotStorePort};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreData {
    #[serde(default)]
    weekly_slots: Vec<WeeklySlot>,
    #[serde(default)]
    slot_inventory: Vec<SlotInventory>,
    #[serde(default)]
    lessons: Vec<Lesson>,
}

/// JSON-file record store. `path = None` keeps everything in memory.
pub struct LocalSlotStore {
    path: Option<PathBuf>,
    cache: tokio::sync::RwLock<StoreData>,
}

impl LocalSlotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            cache: tokio::sync::RwLock::new(StoreData::default()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            cache: tokio::sync::RwLock::new(StoreData::default()),
        }
    }

    /// Load from disk. A missing file is an empty store; a corrupt one is an error.
    pub async fn load(&self) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = match fs::read_to_string(path).await {
            Ok(s) => serde_json::from_str(&s)
                .map_err(|e| DomainError::Store(format!("parse {}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(DomainError::Store(format!("read {}: {}", path.display(), e))),
        };
        info!(
            path = %path.display(),
            weekly = data.weekly_slots.len(),
            inventory = data.slot_inventory.len(),
            lessons = data.lessons.len(),
            "local store loaded"
        );
        *self.cache.write().await = data;
        Ok(())
    }

    /// Atomic save: temp file, fsync, rename over the target.
    async fn save(&self, data: &StoreData) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Store(format!("create data dir: {}", e)))?;
        }
        let json =
            serde_json::to_string_pretty(data).map_err(|e| DomainError::Store(e.to_string()))?;

        let temp_path = path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Store(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Store(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Store(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| DomainError::Store(format!("atomic rename failed: {}", e)))?;
        Ok(())
    }

    /// Apply `f` to a copy of the data and persist it. The cache only changes if both
    /// the edit and the save succeed.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        let out = f(&mut next)?;
        self.save(&next).await?;
        *cache = next;
        Ok(out)
    }

    /// Add a committed lesson, e.g. from the billing side.
    pub async fn add_lesson(&self, lesson: Lesson) -> Result<Lesson, DomainError> {
        self.mutate(|d| {
            d.lessons.retain(|l| l.id != lesson.id);
            d.lessons.push(lesson.clone());
            Ok(lesson)
        })
        .await
    }

    pub async fn lessons(&self) -> Vec<Lesson> {
        self.cache.read().await.lessons.clone()
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn not_found(kind: &str, id: &str) -> DomainError {
    DomainError::NotFound(format!("{} {}", kind, id))
}

fn lesson_item(lesson: &Lesson, range: &TimeRange) -> ConflictItem {
    let who = lesson.student_name.as_deref().unwrap_or("student");
    ConflictItem {
        source: ConflictSource::Lessons,
        record_id: lesson.id.clone(),
        start: format_instant(&range.start),
        end: format_instant(&range.end),
        label: format!("Lesson with {}", who),
        meta: serde_json::json!({
            "studentId": lesson.student_id,
            "studentName": lesson.student_name,
            "durationMinutes": lesson.duration_minutes,
        }),
    }
}

fn slot_item(slot: &SlotInventory, range: &TimeRange) -> ConflictItem {
    ConflictItem {
        source: ConflictSource::SlotInventory,
        record_id: slot.id.clone(),
        start: format_instant(&range.start),
        end: format_instant(&range.end),
        label: format!("{} slot", slot.status),
        meta: serde_json::json!({ "status": slot.status }),
    }
}

/// Lessons of `teacher_id` overlapping `wanted`, except those in `exclude`.
fn lesson_conflicts(
    data: &StoreData,
    teacher_id: &str,
    wanted: &TimeRange,
    exclude: &[String],
) -> Vec<ConflictItem> {
    data.lessons
        .iter()
        .filter(|l| l.teacher_id == teacher_id && !exclude.contains(&l.id))
        .filter_map(|l| {
            let range = l.time_range()?;
            range.overlaps(wanted).then(|| lesson_item(l, &range))
        })
        .collect()
}

/// Open slots of `teacher_id` overlapping `wanted`, except `exclude_id`.
fn slot_conflicts(
    data: &StoreData,
    teacher_id: &str,
    wanted: &TimeRange,
    exclude_id: Option<&str>,
) -> Vec<ConflictItem> {
    data.slot_inventory
        .iter()
        .filter(|s| s.teacher_id == teacher_id && s.status != InventoryStatus::Canceled)
        .filter(|s| exclude_id.is_none_or(|id| s.id != id))
        .filter_map(|s| {
            let range = s.time_range()?;
            range.overlaps(wanted).then(|| slot_item(s, &range))
        })
        .collect()
}

/// Refuse the write if it lands on someone's lesson.
fn enforce_no_double_booking(
    data: &StoreData,
    teacher_id: &str,
    wanted: Option<TimeRange>,
    exclude: &[String],
) -> Result<(), DomainError> {
    let Some(wanted) = wanted else {
        return Ok(());
    };
    let lessons = lesson_conflicts(data, teacher_id, &wanted, exclude);
    if lessons.is_empty() {
        return Ok(());
    }
    Err(DomainError::WriteConflict(ConflictReport {
        message: Some("Slot overlaps an existing lesson".to_string()),
        items: lessons,
    }))
}

/// Create the lesson a reservation commits and link it to the slot.
fn book_lesson(data: &mut StoreData, slot: &mut SlotInventory, student_id: Option<String>) {
    let duration = match (
        parse_time_to_minutes(&slot.start_time),
        parse_time_to_minutes(&slot.end_time),
    ) {
        (Some(s), Some(e)) if e > s => e - s,
        _ => 0,
    };
    let lesson = Lesson {
        id: new_id(),
        teacher_id: slot.teacher_id.clone(),
        student_id: student_id.clone(),
        student_name: None,
        date: slot.date.clone(),
        start_time: slot.start_time.clone(),
        duration_minutes: duration,
        slot_id: Some(slot.id.clone()),
    };
    slot.lessons.push(lesson.id.clone());
    slot.student_id = student_id;
    data.lessons.push(lesson);
}

fn bump(version: Option<u64>) -> Option<u64> {
    Some(version.unwrap_or(0) + 1)
}

#[async_trait::async_trait]
impl SlotStorePort for LocalSlotStore {
    async fn list_weekly(&self) -> Result<Vec<WeeklySlot>, DomainError> {
        Ok(self.cache.read().await.weekly_slots.clone())
    }

    async fn create_weekly(&self, draft: &WeeklySlotDraft) -> Result<WeeklySlot, DomainError> {
        self.mutate(|d| {
            let slot = WeeklySlot {
                id: new_id(),
                teacher_id: draft.teacher_id.clone(),
                day_of_week: draft.day_of_week.clone(),
                start_time: draft.start_time.clone(),
                end_time: draft.end_time.clone(),
                slot_type: draft.slot_type,
                is_fixed: draft.is_fixed,
                reserved_for_ids: draft.reserved_for_ids.clone(),
                status: draft.status,
            };
            d.weekly_slots.push(slot.clone());
            Ok(slot)
        })
        .await
    }

    async fn update_weekly(
        &self,
        id: &str,
        draft: &WeeklySlotDraft,
    ) -> Result<WeeklySlot, DomainError> {
        self.mutate(|d| {
            let slot = d
                .weekly_slots
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| not_found("weekly slot", id))?;
            slot.teacher_id = draft.teacher_id.clone();
            slot.day_of_week = draft.day_of_week.clone();
            slot.start_time = draft.start_time.clone();
            slot.end_time = draft.end_time.clone();
            slot.slot_type = draft.slot_type;
            slot.is_fixed = draft.is_fixed;
            slot.reserved_for_ids = draft.reserved_for_ids.clone();
            slot.status = draft.status;
            Ok(slot.clone())
        })
        .await
    }

    async fn set_weekly_status(
        &self,
        id: &str,
        status: WeeklyStatus,
    ) -> Result<WeeklySlot, DomainError> {
        self.mutate(|d| {
            let slot = d
                .weekly_slots
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| not_found("weekly slot", id))?;
            slot.status = status;
            Ok(slot.clone())
        })
        .await
    }

    async fn delete_weekly(&self, id: &str) -> Result<(), DomainError> {
        self.mutate(|d| {
            let before = d.weekly_slots.len();
            d.weekly_slots.retain(|s| s.id != id);
            if d.weekly_slots.len() == before {
                return Err(not_found("weekly slot", id));
            }
            Ok(())
        })
        .await
    }

    async fn list_inventory(&self, range: &DateRange) -> Result<Vec<SlotInventory>, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache
            .slot_inventory
            .iter()
            .filter(|s| parse_date(&s.date).is_some_and(|d| range.contains(d)))
            .cloned()
            .collect())
    }

    async fn create_inventory(
        &self,
        draft: &InventoryDraft,
    ) -> Result<SlotInventory, DomainError> {
        self.mutate(|d| {
            let wanted = TimeRange::on_date(&draft.date, &draft.start_time, &draft.end_time);
            enforce_no_double_booking(d, &draft.teacher_id, wanted, &[])?;
            let mut slot = SlotInventory {
                id: new_id(),
                teacher_id: draft.teacher_id.clone(),
                date: draft.date.clone(),
                start_time: draft.start_time.clone(),
                end_time: draft.end_time.clone(),
                status: draft.status,
                lessons: Vec::new(),
                student_id: None,
                weekly_slot_id: draft.weekly_slot_id.clone(),
                version: Some(1),
            };
            if draft.status == InventoryStatus::Booked {
                book_lesson(d, &mut slot, draft.student_id.clone());
            }
            debug!(record_id = %slot.id, date = %slot.date, "inventory created");
            d.slot_inventory.push(slot.clone());
            Ok(slot)
        })
        .await
    }

    async fn update_inventory(
        &self,
        id: &str,
        update: &InventoryUpdate,
    ) -> Result<SlotInventory, DomainError> {
        self.mutate(|d| {
            let idx = d
                .slot_inventory
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| not_found("slot", id))?;
            let current = d.slot_inventory[idx].clone();
            if let (Some(expected), Some(actual)) = (update.expected_version, current.version) {
                if expected != actual {
                    return Err(DomainError::StaleRecord {
                        record_id: id.to_string(),
                    });
                }
            }
            let wanted = TimeRange::on_date(&update.date, &update.start_time, &update.end_time);
            enforce_no_double_booking(d, &update.teacher_id, wanted, &current.lessons)?;

            let mut slot = current;
            slot.teacher_id = update.teacher_id.clone();
            slot.date = update.date.clone();
            slot.start_time = update.start_time.clone();
            slot.end_time = update.end_time.clone();
            slot.status = update.status;
            slot.version = bump(slot.version);

            let duration = wanted.map(|r| r.duration_minutes().max(0) as u32);
            for lesson in d.lessons.iter_mut().filter(|l| slot.lessons.contains(&l.id)) {
                lesson.teacher_id = slot.teacher_id.clone();
                lesson.date = slot.date.clone();
                lesson.start_time = slot.start_time.clone();
                if let Some(minutes) = duration {
                    lesson.duration_minutes = minutes;
                }
            }
            d.slot_inventory[idx] = slot.clone();
            Ok(slot)
        })
        .await
    }

    async fn transition_inventory(
        &self,
        id: &str,
        change: &StatusChange,
    ) -> Result<SlotInventory, DomainError> {
        self.mutate(|d| {
            let idx = d
                .slot_inventory
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| not_found("slot", id))?;
            let mut slot = d.slot_inventory[idx].clone();
            if !slot.status.can_transition_to(change.status) {
                return Err(DomainError::InvalidTransition {
                    from: slot.status,
                    to: change.status,
                });
            }
            if change.status == InventoryStatus::Booked {
                enforce_no_double_booking(d, &slot.teacher_id, slot.time_range(), &slot.lessons)?;
                book_lesson(d, &mut slot, change.student_id.clone());
            }
            slot.status = change.status;
            slot.version = bump(slot.version);
            d.slot_inventory[idx] = slot.clone();
            Ok(slot)
        })
        .await
    }

    async fn delete_inventory(&self, id: &str) -> Result<(), DomainError> {
        self.mutate(|d| {
            let before = d.slot_inventory.len();
            d.slot_inventory.retain(|s| s.id != id);
            if d.slot_inventory.len() == before {
                return Err(not_found("slot", id));
            }
            for lesson in d.lessons.iter_mut().filter(|l| l.slot_id.as_deref() == Some(id)) {
                lesson.slot_id = None;
            }
            Ok(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl ConflictCheckPort for LocalSlotStore {
    async fn check(
        &self,
        request: &ConflictCheckRequest,
    ) -> Result<ConflictCheckResponse, DomainError> {
        let wanted = TimeRange::on_date(&request.date, &request.start, &request.end)
            .ok_or_else(|| DomainError::ConflictCheck("unparsable date or time".to_string()))?;
        let cache = self.cache.read().await;
        let linked = request.linked_lesson_ids.as_deref().unwrap_or(&[]);
        let mut conflicts = lesson_conflicts(&cache, &request.teacher_id, &wanted, linked);
        conflicts.extend(slot_conflicts(
            &cache,
            &request.teacher_id,
            &wanted,
            request.record_id.as_deref(),
        ));
        Ok(ConflictCheckResponse {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        })
    }
}
