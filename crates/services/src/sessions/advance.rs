use chrono::{DateTime, Utc};

/// Handle for the single delayed advance a session may have outstanding.
///
/// Scheduling a new advance replaces the previous handle, so at most one
/// advance can ever fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    due_at: DateTime<Utc>,
}

impl PendingAdvance {
    #[must_use]
    pub fn new(due_at: DateTime<Utc>) -> Self {
        Self { due_at }
    }

    #[must_use]
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.due_at
    }
}

/// Owner of the pending-advance slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AdvanceTimer {
    pending: Option<PendingAdvance>,
}

impl AdvanceTimer {
    /// Replaces any outstanding advance. Returns true if one was cancelled.
    pub(crate) fn schedule(&mut self, due_at: DateTime<Utc>) -> bool {
        self.pending.replace(PendingAdvance::new(due_at)).is_some()
    }

    /// Drops the outstanding advance. Returns true if one existed.
    pub(crate) fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Consumes the outstanding advance if its deadline has passed.
    pub(crate) fn take_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.pending {
            Some(p) if p.is_due(now) => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn pending(&self) -> Option<PendingAdvance> {
        self.pending
    }
}
