//! Template materialization. Expand weekly templates into dated inventory drafts.

use super::entities::{
    DateRange, InventoryDraft, InventoryStatus, SlotInventory, Weekday, WeeklySlot,
};
use super::overlap::TimeRange;

/// One draft per (active template, matching date) in `range`.
///
/// Paused templates and templates with an unknown day are skipped. A date is also skipped
/// when the same teacher already has a non-canceled slot overlapping the template's time,
/// which makes repeated runs over the same range a no-op. Fixed templates with reserved
/// students produce `booked` drafts for the first reserved student.
pub fn materialize(
    templates: &[WeeklySlot],
    range: &DateRange,
    existing: &[SlotInventory],
) -> Vec<InventoryDraft> {
    let mut drafts: Vec<InventoryDraft> = Vec::new();

    for template in templates.iter().filter(|t| t.is_active()) {
        let Some(day) = template.day_of_week.known() else {
            continue;
        };
        for date in range.dates().filter(|d| Weekday::of_date(*d) == day) {
            let date = date.format("%Y-%m-%d").to_string();
            let Some(wanted) = TimeRange::on_date(&date, &template.start_time, &template.end_time)
            else {
                continue;
            };
            if wanted.is_empty() {
                continue;
            }
            let committed = existing
                .iter()
                .filter(|s| s.status != InventoryStatus::Canceled)
                .filter(|s| s.teacher_id == template.teacher_id)
                .filter_map(|s| s.time_range());
            let planned = drafts
                .iter()
                .filter(|d| d.teacher_id == template.teacher_id)
                .filter_map(|d| TimeRange::on_date(&d.date, &d.start_time, &d.end_time));
            if committed.chain(planned).any(|r| r.overlaps(&wanted)) {
                continue;
            }

            let mut draft = InventoryDraft::open(
                &template.teacher_id,
                &date,
                &template.start_time,
                &template.end_time,
            );
            draft.weekly_slot_id = Some(template.id.clone());
            if template.is_fixed {
                if let Some(student) = template.reserved_for_ids.first() {
                    draft.status = InventoryStatus::Booked;
                    draft.student_id = Some(student.clone());
                }
            }
            drafts.push(draft);
        }
    }
    drafts
}
