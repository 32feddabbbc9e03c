//! Rotation configuration.
//!
//! A rotation names, per weekday, the employee responsible for a role that
//! must be covered every working day, with an optional backup. Exceptions
//! override the weekly table for a single date.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::EmployeeId;

/// Rotation-governed role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RotationType {
    /// Rotation production work (e.g. the daily specialty station).
    Specialty,
    /// Lead of the day: first choice for support tasks, owns shift block 1.
    Lead,
}

/// Weekly rotation row: who covers `rotation_type` on `weekday`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationAssignment {
    /// Day of week this row applies to.
    pub weekday: Weekday,
    /// Rotation role.
    pub rotation_type: RotationType,
    /// Primary employee.
    pub primary: EmployeeId,
    /// Optional backup employee.
    pub backup: Option<EmployeeId>,
}

/// One-off override of the weekly rotation for a specific date.
///
/// - `replacement: Some(..)`: that employee covers the date outright.
/// - `replacement: None` with `removed: Some(..)`: the removed employee does
///   not cover the date; the weekly backup (if any) does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationException {
    /// Date the exception applies to.
    pub date: NaiveDate,
    /// Rotation role.
    pub rotation_type: RotationType,
    /// Employee covering the date instead of the weekly assignment.
    pub replacement: Option<EmployeeId>,
    /// Employee taken off the rotation for this date.
    pub removed: Option<EmployeeId>,
}

impl RotationAssignment {
    /// Creates a weekly row without a backup.
    pub fn new(
        weekday: Weekday,
        rotation_type: RotationType,
        primary: impl Into<EmployeeId>,
    ) -> Self {
        Self {
            weekday,
            rotation_type,
            primary: primary.into(),
            backup: None,
        }
    }

    /// Sets the backup employee.
    pub fn with_backup(mut self, backup: impl Into<EmployeeId>) -> Self {
        self.backup = Some(backup.into());
        self
    }
}

impl RotationException {
    /// Replaces whoever the weekly table names with `employee` on `date`.
    pub fn replace(
        date: NaiveDate,
        rotation_type: RotationType,
        employee: impl Into<EmployeeId>,
    ) -> Self {
        Self {
            date,
            rotation_type,
            replacement: Some(employee.into()),
            removed: None,
        }
    }

    /// Takes `employee` off the rotation on `date` without naming a replacement.
    pub fn remove(
        date: NaiveDate,
        rotation_type: RotationType,
        employee: impl Into<EmployeeId>,
    ) -> Self {
        Self {
            date,
            rotation_type,
            replacement: None,
            removed: Some(employee.into()),
        }
    }
}
