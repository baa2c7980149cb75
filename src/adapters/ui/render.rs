//! Text rendering for slots, conflicts and errors. Pure string building plus a few
//! colored print helpers.

use crate::domain::{
    ConflictItem, DomainError, OverrideAuditEntry, SlotInventory, Weekday, WeeklySlot,
    WeeklySlotOverlap, WeeklyStatus,
};
use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use std::io::{Write, stdout};

pub fn weekly_line(s: &WeeklySlot) -> String {
    let paused = if s.status == WeeklyStatus::Paused {
        " [paused]"
    } else {
        ""
    };
    let fixed = if s.is_fixed && !s.reserved_for_ids.is_empty() {
        format!(" fixed for {}", s.reserved_for_ids.join(","))
    } else {
        String::new()
    };
    format!(
        "{:<9} {}–{} {}{}{}  teacher {}  ({})",
        s.day_of_week.to_string(),
        s.start_time,
        s.end_time,
        s.slot_type.as_str(),
        fixed,
        paused,
        s.teacher_id,
        s.id
    )
}

pub fn inventory_line(r: &SlotInventory, pending: bool) -> String {
    let day = crate::domain::entities::parse_date(&r.date)
        .map(|d| Weekday::of_date(d).name()[..3].to_string())
        .unwrap_or_else(|| "???".to_string());
    let student = r
        .student_id
        .as_deref()
        .map(|s| format!(" student {}", s))
        .unwrap_or_default();
    let pending = if pending { " (pending)" } else { "" };
    format!(
        "{} {} {}–{} {:<8}{}{}  teacher {}  ({})",
        r.date, day, r.start_time, r.end_time, r.status.as_str(), student, pending, r.teacher_id, r.id
    )
}

pub fn overlap_lines(overlaps: &[WeeklySlotOverlap]) -> Vec<String> {
    overlaps
        .iter()
        .map(|o| {
            let day = Weekday::from_index(o.day_of_week)
                .map(|d| d.name())
                .unwrap_or("?");
            format!("{} {}–{} ({})", day, o.start_time, o.end_time, o.slot_id)
        })
        .collect()
}

pub fn conflict_lines(items: &[ConflictItem]) -> Vec<String> {
    items.iter().map(|i| i.describe()).collect()
}

pub fn audit_line(e: &OverrideAuditEntry) -> String {
    format!(
        "{}  {} {}  teacher {}  {}",
        e.recorded_at.format("%Y-%m-%d %H:%M"),
        e.entity,
        e.record_id,
        e.teacher_id,
        e.conflict_summary
    )
}

/// Operator-facing message. Conflict reports keep their per-item lines.
pub fn error_message(e: &DomainError) -> String {
    match e {
        DomainError::BlockingConflict(report) => {
            let mut lines = vec!["Save refused: the slot overlaps a booked lesson.".to_string()];
            lines.extend(conflict_lines(&report.items).into_iter().map(|l| format!("  - {}", l)));
            lines.push("Change the time or cancel.".to_string());
            lines.join("\n")
        }
        DomainError::WriteConflict(report) => {
            let mut lines = vec![format!(
                "The record store refused the save: {}",
                report.message.as_deref().unwrap_or("conflict")
            )];
            lines.extend(conflict_lines(&report.items).into_iter().map(|l| format!("  - {}", l)));
            lines.push("Re-open the slot and try again.".to_string());
            lines.join("\n")
        }
        other => other.to_string(),
    }
}

fn print_colored(color: Color, text: &str) {
    let mut out = stdout();
    let _ = out.execute(SetForegroundColor(color));
    for line in text.lines() {
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
    }
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

pub fn print_ok(text: &str) {
    print_colored(Color::Green, text);
}

pub fn print_warning(text: &str) {
    print_colored(Color::Yellow, text);
}

pub fn print_error(text: &str) {
    print_colored(Color::Red, text);
}
