//! Transaction identifier issuance.
//!
//! Identifiers are Unix timestamps in whole seconds, bumped past the last
//! issued value when several are requested within the same second or when
//! the wall clock steps backward: `next = max(now, last + 1)`.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::model::EntryId;

/// Source of the current time in whole Unix seconds.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}

/// Issues unique, strictly increasing [`EntryId`]s.
///
/// The generator is an explicit object owned by the intake path; every call
/// to [`next_id`](Self::next_id) goes through a single mutex, so concurrent
/// callers never observe the same value.
#[derive(Debug)]
pub struct IdGenerator<C = SystemClock> {
    clock: C,
    last_issued: Mutex<i64>,
}

impl IdGenerator<SystemClock> {
    /// Generator driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for IdGenerator<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> IdGenerator<C> {
    /// Generator driven by a custom clock.
    #[must_use]
    pub const fn with_clock(clock: C) -> Self {
        Self {
            clock,
            last_issued: Mutex::new(0),
        }
    }

    /// Never issue a value at or below `last`.
    ///
    /// Used to seed the generator from identifiers already present in the
    /// journal, so a restart with a lagging clock cannot reuse an id.
    #[must_use]
    pub fn resume_after(self, last: i64) -> Self {
        self.observe(last);
        self
    }

    /// Raise the floor to `last` if it is above what has been issued.
    ///
    /// Called under the journal lock with the largest id on disk, so ids
    /// written by another process since this generator was seeded are
    /// skipped too.
    pub fn observe(&self, last: i64) {
        let mut guard = self.last_issued.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = (*guard).max(last);
    }

    /// Issue the next identifier.
    pub fn next_id(&self) -> EntryId {
        let mut last = self.last_issued.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now_secs();
        let next = now.max(last.saturating_add(1));
        *last = next;
        trace!(now, next, "issued entry id");
        EntryId::from(next)
    }

    /// The most recently issued (or seeded) value.
    #[must_use]
    pub fn last_issued(&self) -> i64 {
        *self.last_issued.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
