//! Double-submission guard and edit-session tickets.
//!
//! `InFlight` rejects a second invocation while one is pending. `EditSession` tags each
//! request with the generation of the form that issued it; closing or switching the form
//! bumps the generation so late results are discarded instead of applied.

use crate::domain::DomainError;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag. Fails with `Busy` while another guard is alive.
    pub fn try_begin(&self, action: &str) -> Result<InFlightGuard<'_>, DomainError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DomainError::Busy(format!("{} already in progress", action)));
        }
        Ok(InFlightGuard { flag: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the flag on drop, including on early return or error.
#[must_use = "the in-flight flag is released as soon as the guard is dropped"]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Identity of the edit form a request was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct EditSession {
    generation: AtomicU64,
    record: Mutex<Option<String>>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a form for `record_id` (`None` for a new record). Invalidates earlier tickets.
    pub fn open(&self, record_id: Option<&str>) -> SessionTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut record = self.record.lock().unwrap_or_else(|e| e.into_inner());
        *record = record_id.map(str::to_string);
        SessionTicket { generation }
    }

    /// Close the current form. Pending results from it are discarded.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let mut record = self.record.lock().unwrap_or_else(|e| e.into_inner());
        *record = None;
    }

    pub fn ticket(&self) -> SessionTicket {
        SessionTicket {
            generation: self.generation.load(Ordering::Acquire),
        }
    }

    pub fn current_record(&self) -> Option<String> {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.generation
    }

    pub fn ensure_current(&self, ticket: &SessionTicket) -> Result<(), DomainError> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            Err(DomainError::Superseded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_busy_until_guard_drops() {
        let flag = InFlight::new();
        let guard = flag.try_begin("save").unwrap();
        assert!(matches!(flag.try_begin("save"), Err(DomainError::Busy(_))));
        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_begin("save").is_ok());
    }

    #[test]
    fn test_close_supersedes_ticket() {
        let session = EditSession::new();
        let ticket = session.open(Some("r1"));
        assert!(session.ensure_current(&ticket).is_ok());
        assert_eq!(session.current_record().as_deref(), Some("r1"));
        session.close();
        assert!(matches!(
            session.ensure_current(&ticket),
            Err(DomainError::Superseded)
        ));
        assert_eq!(session.current_record(), None);
    }

    #[test]
    fn test_switching_record_supersedes_ticket() {
        let session = EditSession::new();
        let first = session.open(Some("r1"));
        let second = session.open(Some("r2"));
        assert!(!session.is_current(&first));
        assert!(session.is_current(&second));
    }
}
