//! Assignment model.
//!
//! An assignment records that an event is (or was meant to be) worked by an
//! employee at a datetime. The engine creates `Proposed`, `Bumped` and
//! `Failed` assignments; `Committed` ones come from the caller as the result
//! of earlier approved runs.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{EmployeeId, EventId, FailureReason, Violation};

/// Assignment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    /// Produced by this run, awaiting approval.
    Proposed,
    /// Approved in an earlier run.
    Committed,
    /// Displaced by a more urgent event.
    Bumped,
    /// Could not be placed.
    Failed,
}

/// An event-employee-datetime assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned event.
    pub event_id: EventId,
    /// Assigned employee. `None` for failures.
    pub employee_id: Option<EmployeeId>,
    /// Scheduled start. For failures, the last date attempted (or due date).
    pub scheduled_at: NaiveDateTime,
    /// Shift block (1..=8) for block-governed events once allocated.
    pub shift_block: Option<u8>,
    /// Lifecycle status.
    pub status: AssignmentStatus,
    /// Why the event could not be placed.
    pub failure: Option<FailureReason>,
    /// Violations of the last attempted candidate (failures only).
    pub violations: Vec<Violation>,
    /// Event whose placement displaced this assignment.
    pub bumped_by: Option<EventId>,
}

impl Assignment {
    /// Creates a proposed assignment.
    pub fn proposed(
        event_id: impl Into<EventId>,
        employee_id: impl Into<EmployeeId>,
        scheduled_at: NaiveDateTime,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            employee_id: Some(employee_id.into()),
            scheduled_at,
            shift_block: None,
            status: AssignmentStatus::Proposed,
            failure: None,
            violations: Vec::new(),
            bumped_by: None,
        }
    }

    /// Creates a committed assignment (input from an earlier run).
    pub fn committed(
        event_id: impl Into<EventId>,
        employee_id: impl Into<EmployeeId>,
        scheduled_at: NaiveDateTime,
    ) -> Self {
        Self {
            status: AssignmentStatus::Committed,
            ..Self::proposed(event_id, employee_id, scheduled_at)
        }
    }

    /// Creates a failure record.
    pub fn failed(
        event_id: impl Into<EventId>,
        at: NaiveDateTime,
        reason: FailureReason,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            employee_id: None,
            scheduled_at: at,
            shift_block: None,
            status: AssignmentStatus::Failed,
            failure: Some(reason),
            violations,
            bumped_by: None,
        }
    }

    /// Sets the shift block.
    pub fn with_block(mut self, block: u8) -> Self {
        self.shift_block = Some(block);
        self
    }

    /// Copy of this assignment marked as displaced by `by`.
    pub fn bumped(&self, by: impl Into<EventId>) -> Self {
        Self {
            status: AssignmentStatus::Bumped,
            bumped_by: Some(by.into()),
            ..self.clone()
        }
    }

    /// Scheduled date.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.scheduled_at.date()
    }

    /// Whether this assignment currently occupies its employee
    /// (proposed or committed).
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            AssignmentStatus::Proposed | AssignmentStatus::Committed
        )
    }

    /// Whether this assignment holds `employee_id`.
    pub fn is_for(&self, employee_id: &str) -> bool {
        self.employee_id.as_deref() == Some(employee_id)
    }
}
