//! Input validation for scheduling snapshots.
//!
//! Checks structural integrity of a snapshot before a run. Anything found
//! here is a caller contract violation and aborts the run. Detects:
//! - Duplicate IDs (events, employees)
//! - Events due before they start, or with zero duration
//! - Shift block configs that are not exactly blocks 1..=8 in arrival order
//! - Duplicate weekly rotation rows
//! - References to unknown employees or events

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AssignmentStatus, BLOCK_COUNT};
use crate::scheduler::ScheduleSnapshot;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An event is due before it starts.
    InvalidDateRange,
    /// An event has a zero duration.
    InvalidDuration,
    /// The shift block config is missing, duplicating, or misordering blocks.
    InvalidShiftConfig,
    /// Two weekly rotation rows cover the same weekday and rotation type.
    DuplicateRotation,
    /// A rotation, exception, or assignment names an unknown employee.
    UnknownEmployee,
    /// An assignment or pair link names an unknown event.
    UnknownEvent,
    /// A committed-input assignment is not in `Committed` state.
    InvalidCommittedStatus,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a snapshot.
///
/// Checks:
/// 1. No duplicate event or employee IDs
/// 2. Every event has `start_date <= due_date` and a positive duration
/// 3. `pair_with` links point to existing events
/// 4. Shift blocks are exactly 1..=8 with non-decreasing arrivals
/// 5. At most one weekly rotation row per (weekday, rotation type)
/// 6. Rotation rows and exceptions reference existing employees
/// 7. Committed assignments are `Committed`, reference existing events and
///    employees, and at most one exists per event
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_snapshot(snapshot: &ScheduleSnapshot<'_>) -> ValidationResult {
    let mut errors = Vec::new();

    let mut employee_ids = BTreeSet::new();
    for e in &snapshot.employees {
        if !employee_ids.insert(e.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate employee ID: {}", e.id),
            ));
        }
    }

    let mut event_ids = BTreeSet::new();
    for ev in &snapshot.events {
        if !event_ids.insert(ev.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate event ID: {}", ev.id),
            ));
        }
        if ev.due_date < ev.start_date {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDateRange,
                format!(
                    "Event '{}' is due {} before it starts {}",
                    ev.id, ev.due_date, ev.start_date
                ),
            ));
        }
        if ev.duration_minutes == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("Event '{}' has zero duration", ev.id),
            ));
        }
    }

    for ev in &snapshot.events {
        if let Some(primary) = &ev.pair_with {
            if !event_ids.contains(primary.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownEvent,
                    format!("Event '{}' is paired with unknown event '{}'", ev.id, primary),
                ));
            }
        }
    }

    errors.extend(check_shift_blocks(snapshot));

    let mut rows = BTreeSet::new();
    for row in &snapshot.rotations {
        if !rows.insert((row.weekday.num_days_from_monday(), row.rotation_type)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateRotation,
                format!(
                    "Duplicate {:?} rotation for {}",
                    row.rotation_type, row.weekday
                ),
            ));
        }
        for id in std::iter::once(&row.primary).chain(row.backup.iter()) {
            if !employee_ids.contains(id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownEmployee,
                    format!("{} rotation references unknown employee '{}'", row.weekday, id),
                ));
            }
        }
    }

    for ex in &snapshot.exceptions {
        for id in ex.replacement.iter().chain(ex.removed.iter()) {
            if !employee_ids.contains(id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownEmployee,
                    format!(
                        "Rotation exception on {} references unknown employee '{}'",
                        ex.date, id
                    ),
                ));
            }
        }
    }

    let mut committed_per_event: BTreeMap<&str, usize> = BTreeMap::new();
    for a in &snapshot.committed {
        if a.status != AssignmentStatus::Committed {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCommittedStatus,
                format!("Committed input for event '{}' has status {:?}", a.event_id, a.status),
            ));
        }
        if !event_ids.contains(a.event_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownEvent,
                format!("Committed assignment references unknown event '{}'", a.event_id),
            ));
        }
        match &a.employee_id {
            Some(id) if employee_ids.contains(id.as_str()) => {}
            Some(id) => errors.push(ValidationError::new(
                ValidationErrorKind::UnknownEmployee,
                format!(
                    "Committed assignment for '{}' references unknown employee '{}'",
                    a.event_id, id
                ),
            )),
            None => errors.push(ValidationError::new(
                ValidationErrorKind::UnknownEmployee,
                format!("Committed assignment for '{}' has no employee", a.event_id),
            )),
        }
        *committed_per_event.entry(a.event_id.as_str()).or_insert(0) += 1;
    }
    for (event_id, count) in committed_per_event {
        if count > 1 {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Event '{event_id}' has {count} committed assignments"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_shift_blocks(snapshot: &ScheduleSnapshot<'_>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let blocks = &snapshot.shift_blocks.blocks;

    let numbers: BTreeSet<u8> = blocks.iter().map(|b| b.number).collect();
    let expected: BTreeSet<u8> = (1..=BLOCK_COUNT).collect();
    if blocks.len() != usize::from(BLOCK_COUNT) || numbers != expected {
        let found: Vec<u8> = blocks.iter().map(|b| b.number).collect();
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidShiftConfig,
            format!("Shift config must define blocks 1..={BLOCK_COUNT} once each, found {found:?}"),
        ));
        return errors;
    }

    for n in 1..BLOCK_COUNT {
        let (Some(a), Some(b)) = (
            snapshot.shift_blocks.arrival(n),
            snapshot.shift_blocks.arrival(n + 1),
        ) else {
            continue;
        };
        if b < a {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidShiftConfig,
                format!("Shift block {} arrives before block {}", n + 1, n),
            ));
        }
    }
    errors
}
