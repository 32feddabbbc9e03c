//! Constraint violations and failure reasons.
//!
//! A [`Violation`] explains why one (event, employee, datetime) candidate was
//! rejected. Each kind carries a fixed [`ConstraintClass`]: hard violations can
//! never be cured, bumpable ones can be cured by displacing other work.

use serde::{Deserialize, Serialize};

use super::EventId;

/// Whether a violation can be cured by displacing another assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConstraintClass {
    /// Never bumpable.
    Hard,
    /// Cured by bumping the conflicting assignment(s).
    Bumpable,
}

/// Classification of constraint violations, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Employee is not active.
    EmployeeInactive,
    /// Target date is a company-wide holiday.
    CompanyHoliday,
    /// Employee has time off on the target date.
    TimeOff,
    /// Employee is not available on the target date.
    Unavailable,
    /// Employee's role may not work this event type.
    RoleIneligible,
    /// Daily production quota reached.
    DailyQuota,
    /// Weekly production quota reached.
    WeeklyQuota,
    /// Overlaps another same-day assignment of the employee.
    Overlap,
    /// Target date is after the event's due date.
    AfterDueDate,
    /// Target date is before the event's start date.
    BeforeStartDate,
    /// Target date is locked against scheduling.
    LockedDate,
    /// Companion would start on another day than its primary.
    CompanionDayMismatch,
}

/// A constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub kind: ViolationKind,
    /// Hard or bumpable.
    pub class: ConstraintClass,
    /// Human-readable description.
    pub message: String,
    /// Assignments (by event) responsible for a bumpable violation.
    pub blocking: Vec<EventId>,
}

/// Machine-readable reason an event could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// No active employee is eligible for the event type.
    NoQualifiedEmployee,
    /// Rotation had nobody and the fallback pool was empty.
    RotationGap,
    /// Bump budget exhausted.
    BumpLimitExceeded,
    /// No schedulable date inside the event window and horizon.
    DueDateUnreachable,
    /// Every candidate failed on hard constraints.
    AllCandidatesUnavailable,
    /// Candidates failed on bumpable constraints but nothing could be displaced.
    ConflictsNotDisplaceable,
    /// The primary fit, but a required companion could not be placed with it.
    CompanionUnplaceable,
    /// Companion event whose primary cannot be found.
    OrphanCompanion,
}

impl ViolationKind {
    /// Fixed constraint class of this kind.
    pub fn class(self) -> ConstraintClass {
        match self {
            ViolationKind::DailyQuota | ViolationKind::WeeklyQuota | ViolationKind::Overlap => {
                ConstraintClass::Bumpable
            }
            _ => ConstraintClass::Hard,
        }
    }
}

impl Violation {
    /// Creates a violation of `kind` with its fixed class.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            class: kind.class(),
            message: message.into(),
            blocking: Vec::new(),
        }
    }

    /// Records the assignments responsible for this violation.
    pub fn with_blocking(mut self, blocking: Vec<EventId>) -> Self {
        self.blocking = blocking;
        self
    }

    /// Whether this violation can be cured by bumping.
    pub fn is_bumpable(&self) -> bool {
        self.class == ConstraintClass::Bumpable
    }
}

impl FailureReason {
    /// Stable kebab-case code.
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::NoQualifiedEmployee => "no-qualified-employee",
            FailureReason::RotationGap => "rotation-gap",
            FailureReason::BumpLimitExceeded => "bump-limit-exceeded",
            FailureReason::DueDateUnreachable => "due-date-unreachable",
            FailureReason::AllCandidatesUnavailable => "all-candidates-unavailable",
            FailureReason::ConflictsNotDisplaceable => "conflicts-not-displaceable",
            FailureReason::CompanionUnplaceable => "companion-unplaceable",
            FailureReason::OrphanCompanion => "orphan-companion",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
