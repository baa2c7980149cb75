//! Implements InputPort. Inquire-based operator console.
//!
//! Main menu -> weekly templates / one-off slots / materialize / audit log. Every action
//! goes through `SlotLifecycleManager`; this module only prompts and renders.

use super::progress::with_spinner;
use super::render::{
    audit_line, error_message, inventory_line, overlap_lines, print_error, print_ok,
    print_warning, weekly_line,
};
use crate::domain::entities::parse_date;
use crate::domain::{
    DateRange, DomainError, InventoryDraft, InventoryStatus, SlotType, Weekday, WeeklySlotDraft,
    WeeklyStatus,
};
use crate::ports::InputPort;
use crate::usecases::lifecycle::{InventoryEdit, SlotLifecycleManager};
use async_trait::async_trait;
use chrono::Local;
use inquire::{Confirm, InquireError, Select, Text};
use std::sync::{Arc, Mutex};
use tracing::warn;

const AUDIT_PAGE: usize = 20;

/// Outcome of one prompt: an answer, or the operator backed out with Esc.
type Prompted<T> = Result<Option<T>, DomainError>;

fn prompt_result<T>(r: Result<T, InquireError>) -> Prompted<T> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(InquireError::OperationInterrupted) => Err(DomainError::Ui("interrupted".into())),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

fn ask_text(message: &str, default: &str) -> Prompted<String> {
    let mut q = Text::new(message);
    if !default.is_empty() {
        q = q.with_default(default);
    }
    prompt_result(q.prompt()).map(|o| o.map(|s| s.trim().to_string()))
}

/// Pick one of `lines`; returns its index.
fn pick(message: &str, lines: Vec<String>) -> Prompted<usize> {
    if lines.is_empty() {
        print_warning("Nothing to choose from.");
        return Ok(None);
    }
    prompt_result(Select::new(message, lines).with_page_size(15).raw_prompt()).map(|o| o.map(|l| l.index))
}

fn report(result: Result<String, DomainError>) {
    match result {
        Ok(msg) => print_ok(&msg),
        Err(DomainError::Declined) => print_warning("Cancelled."),
        Err(e) if e.is_local() => print_warning(&error_message(&e)),
        Err(e) => print_error(&error_message(&e)),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MainItem {
    Weekly,
    Inventory,
    Materialize,
    Refresh,
    Audit,
    Exit,
}

impl std::fmt::Display for MainItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MainItem::Weekly => "Weekly templates",
            MainItem::Inventory => "One-off slots",
            MainItem::Materialize => "Materialize templates into slots",
            MainItem::Refresh => "Refresh from store",
            MainItem::Audit => "Override audit log",
            MainItem::Exit => "Exit",
        })
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    manager: Arc<SlotLifecycleManager>,
    window_days: i64,
    last_teacher: Mutex<String>,
}

impl TuiInputPort {
    pub fn new(manager: Arc<SlotLifecycleManager>, window_days: i64) -> Self {
        Self {
            manager,
            window_days,
            last_teacher: Mutex::new(String::new()),
        }
    }

    fn window(&self) -> Result<DateRange, DomainError> {
        DateRange::starting(Local::now().date_naive(), self.window_days)
    }

    fn ask_teacher(&self) -> Prompted<String> {
        let last = self
            .last_teacher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let answer = ask_text("Teacher id:", &last)?;
        if let Some(t) = &answer {
            *self.last_teacher.lock().unwrap_or_else(|e| e.into_inner()) = t.clone();
        }
        Ok(answer)
    }

    async fn refresh(&self) {
        let window = match self.window() {
            Ok(w) => w,
            Err(e) => {
                print_error(&error_message(&e));
                return;
            }
        };
        let result = with_spinner("Loading slots", self.manager.refresh(&window)).await;
        report(result.map(|r| {
            let mut msg = format!(
                "{} weekly templates, {} slots ({} – {})",
                r.weekly, r.inventory, window.from, window.to
            );
            if r.duplicates_dropped > 0 {
                msg.push_str(&format!(", {} duplicate record(s) dropped", r.duplicates_dropped));
            }
            msg
        }));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Weekly templates
    // ─────────────────────────────────────────────────────────────────────────

    async fn weekly_menu(&self) -> Result<(), DomainError> {
        let actions = vec!["List", "Create", "Edit", "Pause / resume", "Delete", "Back"];
        let Some(choice) = prompt_result(Select::new("Weekly templates", actions).prompt())? else {
            return Ok(());
        };
        match choice {
            "List" => {
                let snap = self.manager.snapshot();
                if snap.weekly.is_empty() {
                    print_warning("No weekly templates.");
                }
                for s in &snap.weekly {
                    println!("{}", weekly_line(s));
                }
            }
            "Create" => {
                let Some(draft) = self.ask_weekly_draft(None)? else {
                    return Ok(());
                };
                if !self.accept_overlaps(&draft, None)? {
                    return Ok(());
                }
                let result = with_spinner("Saving", self.manager.create_weekly(draft)).await;
                report(result.map(|s| format!("Created {}", weekly_line(&s.slot))));
            }
            "Edit" => {
                let Some(id) = self.pick_weekly("Edit which template?")? else {
                    return Ok(());
                };
                let Some(current) = self.manager.snapshot().weekly_by_id(&id).map(WeeklySlotDraft::from)
                else {
                    return Ok(());
                };
                let Some(draft) = self.ask_weekly_draft(Some(&current))? else {
                    return Ok(());
                };
                if !self.accept_overlaps(&draft, Some(&id))? {
                    return Ok(());
                }
                let result = with_spinner("Saving", self.manager.update_weekly(&id, draft)).await;
                report(result.map(|s| format!("Updated {}", weekly_line(&s.slot))));
            }
            "Pause / resume" => {
                let Some(id) = self.pick_weekly("Toggle which template?")? else {
                    return Ok(());
                };
                let result = with_spinner("Saving", self.manager.toggle_weekly(&id)).await;
                report(result.map(|s| format!("Now {}", weekly_line(&s))));
            }
            "Delete" => {
                let Some(id) = self.pick_weekly("Delete which template?")? else {
                    return Ok(());
                };
                report(
                    self.manager
                        .delete_weekly(&id)
                        .await
                        .map(|_| "Template deleted".to_string()),
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn pick_weekly(&self, message: &str) -> Prompted<String> {
        let snap = self.manager.snapshot();
        let lines = snap.weekly.iter().map(weekly_line).collect();
        Ok(pick(message, lines)?.and_then(|i| snap.weekly.get(i).map(|s| s.id.clone())))
    }

    fn ask_weekly_draft(&self, current: Option<&WeeklySlotDraft>) -> Prompted<WeeklySlotDraft> {
        let Some(teacher_id) = (match current {
            Some(c) => ask_text("Teacher id:", &c.teacher_id)?,
            None => self.ask_teacher()?,
        }) else {
            return Ok(None);
        };
        let start_day = current
            .and_then(|c| c.day_of_week.known())
            .map(|d| d.index() as usize)
            .unwrap_or(0);
        let Some(day) =
            prompt_result(Select::new("Day:", Weekday::ALL.to_vec()).with_starting_cursor(start_day).prompt())?
        else {
            return Ok(None);
        };
        let Some(start_time) = ask_text("Start (HH:MM):", current.map_or("", |c| c.start_time.as_str()))? else {
            return Ok(None);
        };
        let Some(end_time) = ask_text("End (HH:MM):", current.map_or("", |c| c.end_time.as_str()))? else {
            return Ok(None);
        };
        let types: Vec<&str> = SlotType::ALL.iter().map(|t| t.as_str()).collect();
        let type_cursor = current
            .and_then(|c| SlotType::ALL.iter().position(|t| *t == c.slot_type))
            .unwrap_or(0);
        let Some(type_idx) =
            prompt_result(Select::new("Type:", types).with_starting_cursor(type_cursor).raw_prompt())?
        else {
            return Ok(None);
        };
        let Some(is_fixed) = prompt_result(
            Confirm::new("Fixed (auto-book reserved students)?")
                .with_default(current.is_some_and(|c| c.is_fixed))
                .prompt(),
        )?
        else {
            return Ok(None);
        };
        let reserved_for_ids = if is_fixed {
            let existing = current.map(|c| c.reserved_for_ids.join(",")).unwrap_or_default();
            let Some(ids) = ask_text("Reserved student ids (comma separated):", &existing)? else {
                return Ok(None);
            };
            ids.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };
        Ok(Some(WeeklySlotDraft {
            teacher_id,
            day_of_week: day.into(),
            start_time,
            end_time,
            slot_type: SlotType::ALL[type_idx.index],
            is_fixed,
            reserved_for_ids,
            status: current.map_or(WeeklyStatus::Active, |c| c.status),
        }))
    }

    /// Show overlapping templates and ask whether to save anyway.
    fn accept_overlaps(&self, draft: &WeeklySlotDraft, id: Option<&str>) -> Result<bool, DomainError> {
        let overlaps = self.manager.weekly_overlaps(draft, id);
        if overlaps.is_empty() {
            return Ok(true);
        }
        print_warning("Overlaps with active templates:");
        for line in overlap_lines(&overlaps) {
            print_warning(&format!("  - {}", line));
        }
        Ok(prompt_result(Confirm::new("Save anyway?").with_default(false).prompt())?.unwrap_or(false))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // One-off slots
    // ─────────────────────────────────────────────────────────────────────────

    async fn inventory_menu(&self) -> Result<(), DomainError> {
        let actions = vec![
            "List", "Create", "Edit", "Reserve", "Block", "Unblock", "Cancel", "Delete", "Back",
        ];
        let Some(choice) = prompt_result(Select::new("One-off slots", actions).prompt())? else {
            return Ok(());
        };
        match choice {
            "List" => {
                let snap = self.manager.snapshot();
                if snap.inventory.is_empty() {
                    print_warning("No slots in the current window.");
                }
                for r in &snap.inventory {
                    println!("{}", inventory_line(r, snap.is_pending(&r.id)));
                }
            }
            "Create" => self.create_inventory().await?,
            "Edit" => self.edit_inventory().await?,
            "Reserve" => {
                let Some(id) = self.pick_inventory("Reserve which slot?", &[InventoryStatus::Open])? else {
                    return Ok(());
                };
                let label = if self.manager.policy().require_student {
                    "Student id:"
                } else {
                    "Student id (optional):"
                };
                let Some(student) = ask_text(label, "")? else {
                    return Ok(());
                };
                let student = Some(student.as_str()).filter(|s| !s.is_empty());
                let result = with_spinner("Reserving", self.manager.reserve(&id, student)).await;
                report(result.map(|r| format!("Booked {}", inventory_line(&r, false))));
            }
            "Block" => {
                let Some(id) = self.pick_inventory("Block which slot?", &[InventoryStatus::Open])? else {
                    return Ok(());
                };
                let result = with_spinner("Saving", self.manager.block(&id)).await;
                report(result.map(|r| format!("Blocked {}", inventory_line(&r, false))));
            }
            "Unblock" => {
                let Some(id) = self.pick_inventory("Unblock which slot?", &[InventoryStatus::Blocked])?
                else {
                    return Ok(());
                };
                let result = with_spinner("Saving", self.manager.unblock(&id)).await;
                report(result.map(|r| format!("Reopened {}", inventory_line(&r, false))));
            }
            "Cancel" => {
                let live = [InventoryStatus::Open, InventoryStatus::Blocked, InventoryStatus::Booked];
                let Some(id) = self.pick_inventory("Cancel which slot?", &live)? else {
                    return Ok(());
                };
                report(
                    self.manager
                        .cancel(&id)
                        .await
                        .map(|r| format!("Canceled {}", inventory_line(&r, false))),
                );
            }
            "Delete" => {
                let any = [
                    InventoryStatus::Open,
                    InventoryStatus::Blocked,
                    InventoryStatus::Booked,
                    InventoryStatus::Canceled,
                ];
                let Some(id) = self.pick_inventory("Delete which slot?", &any)? else {
                    return Ok(());
                };
                report(
                    self.manager
                        .delete_inventory(&id)
                        .await
                        .map(|_| "Slot deleted".to_string()),
                );
            }
            _ => {}
        }
        Ok(())
    }

    fn pick_inventory(&self, message: &str, statuses: &[InventoryStatus]) -> Prompted<String> {
        let snap = self.manager.snapshot();
        let candidates: Vec<_> = snap
            .inventory
            .iter()
            .filter(|r| statuses.contains(&r.status) && !snap.is_pending(&r.id))
            .collect();
        let lines = candidates.iter().map(|r| inventory_line(r, false)).collect();
        Ok(pick(message, lines)?.and_then(|i| candidates.get(i).map(|r| r.id.clone())))
    }

    fn ask_times(&self, current: Option<&InventoryEdit>) -> Prompted<InventoryEdit> {
        let Some(teacher_id) = (match current {
            Some(c) => ask_text("Teacher id:", &c.teacher_id)?,
            None => self.ask_teacher()?,
        }) else {
            return Ok(None);
        };
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let Some(date) = ask_text("Date (YYYY-MM-DD):", current.map_or(today.as_str(), |c| c.date.as_str()))?
        else {
            return Ok(None);
        };
        if parse_date(&date).is_none() {
            print_error("Date must be YYYY-MM-DD.");
            return Ok(None);
        }
        let Some(start_time) = ask_text("Start (HH:MM):", current.map_or("", |c| c.start_time.as_str()))? else {
            return Ok(None);
        };
        let Some(end_time) = ask_text("End (HH:MM):", current.map_or("", |c| c.end_time.as_str()))? else {
            return Ok(None);
        };
        Ok(Some(InventoryEdit {
            teacher_id,
            date,
            start_time,
            end_time,
        }))
    }

    async fn create_inventory(&self) -> Result<(), DomainError> {
        self.manager.open_session(None);
        let Some(edit) = self.ask_times(None)? else {
            self.manager.close_session();
            return Ok(());
        };
        let draft = InventoryDraft::open(&edit.teacher_id, &edit.date, &edit.start_time, &edit.end_time);
        let result = with_spinner("Checking conflicts and saving", self.manager.create_inventory(draft)).await;
        self.manager.close_session();
        report(result.map(|saved| {
            render_overrides(&saved.overridden, saved.check_skipped);
            format!("Created {}", inventory_line(&saved.record, false))
        }));
        Ok(())
    }

    async fn edit_inventory(&self) -> Result<(), DomainError> {
        let editable = [InventoryStatus::Open, InventoryStatus::Blocked, InventoryStatus::Booked];
        let Some(id) = self.pick_inventory("Edit which slot?", &editable)? else {
            return Ok(());
        };
        let Some(current) = self.manager.snapshot().inventory_by_id(&id).map(InventoryEdit::from) else {
            return Ok(());
        };
        self.manager.open_session(Some(&id));
        let Some(edit) = self.ask_times(Some(&current))? else {
            self.manager.close_session();
            return Ok(());
        };
        let result = with_spinner("Checking conflicts and saving", self.manager.update_inventory(&id, edit)).await;
        self.manager.close_session();
        report(result.map(|saved| {
            render_overrides(&saved.overridden, saved.check_skipped);
            format!("Updated {}", inventory_line(&saved.record, false))
        }));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Materialize / audit
    // ─────────────────────────────────────────────────────────────────────────

    async fn materialize(&self) -> Result<(), DomainError> {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let Some(from) = ask_text("From (YYYY-MM-DD):", &today)? else {
            return Ok(());
        };
        let Some(days) = ask_text("Number of days:", &self.window_days.to_string())? else {
            return Ok(());
        };
        let (Some(from), Ok(days)) = (parse_date(&from), days.parse::<i64>()) else {
            print_error("Expected a YYYY-MM-DD date and a whole number of days.");
            return Ok(());
        };
        let range = match DateRange::starting(from, days) {
            Ok(r) => r,
            Err(e) => {
                print_error(&error_message(&e));
                return Ok(());
            }
        };
        let result = with_spinner("Materializing", self.manager.materialize_range(&range)).await;
        report(result.map(|r| {
            for (draft, reason) in &r.skipped {
                print_warning(&format!(
                    "  skipped {} {}–{}: {}",
                    draft.date, draft.start_time, draft.end_time, reason
                ));
            }
            format!("{} slot(s) created, {} skipped", r.created.len(), r.skipped.len())
        }));
        Ok(())
    }

    async fn show_audit(&self) {
        match self.manager.recent_overrides(AUDIT_PAGE).await {
            Ok(entries) if entries.is_empty() => print_warning("No overrides recorded."),
            Ok(entries) => {
                for e in &entries {
                    println!("{}", audit_line(e));
                }
            }
            Err(e) => print_error(&error_message(&e)),
        }
    }
}

fn render_overrides(overridden: &[crate::domain::ConflictItem], check_skipped: bool) {
    if check_skipped {
        print_warning("Conflict check unavailable; saved without it.");
    }
    if overridden.is_empty() {
        return;
    }
    print_warning("Saved over overlapping slots (recorded in the audit log):");
    for item in overridden {
        print_warning(&format!("  - {}", item.describe()));
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        self.refresh().await;
        let items = vec![
            MainItem::Weekly,
            MainItem::Inventory,
            MainItem::Materialize,
            MainItem::Refresh,
            MainItem::Audit,
            MainItem::Exit,
        ];
        loop {
            let Some(choice) = prompt_result(Select::new("Main menu", items.clone()).prompt())? else {
                continue;
            };
            let outcome = match choice {
                MainItem::Weekly => self.weekly_menu().await,
                MainItem::Inventory => self.inventory_menu().await,
                MainItem::Materialize => self.materialize().await,
                MainItem::Refresh => {
                    self.refresh().await;
                    Ok(())
                }
                MainItem::Audit => {
                    self.show_audit().await;
                    Ok(())
                }
                MainItem::Exit => return Ok(()),
            };
            match outcome {
                Ok(()) => {}
                Err(DomainError::Ui(msg)) if msg == "interrupted" => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "menu action failed");
                    print_error(&error_message(&e));
                }
            }
        }
    }
}
