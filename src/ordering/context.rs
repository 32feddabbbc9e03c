//! Ordering context passed to rules.

use chrono::NaiveDate;

/// Run-level state visible to ordering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingContext {
    /// Reference date of the run.
    pub today: NaiveDate,
}

impl OrderingContext {
    /// Creates a context for a run on `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Whole days from today to `date` (negative if in the past).
    pub fn days_until(&self, date: NaiveDate) -> i64 {
        (date - self.today).num_days()
    }
}
