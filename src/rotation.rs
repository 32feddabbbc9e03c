//! Rotation resolution.
//!
//! Resolves who covers a rotation-governed role on a date. A one-off
//! [`RotationException`] for the exact (date, type) wins over the weekly
//! [`RotationAssignment`] table.
//!
//! # Resolution Order
//!
//! 1. Exception with a replacement: the replacement.
//! 2. Weekly row for the weekday: the backup if `prefer_backup` and a backup
//!    exists, else the primary.
//! 3. A removal-only exception strikes the removed employee from step 2; the
//!    backup stands in, or nobody.
//!
//! `None` tells the caller to fall back to the qualified-employee pool.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::{EmployeeId, EventType, RotationAssignment, RotationException, RotationType};

/// Weekly rotation table plus date exceptions, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct RotationManager {
    weekly: BTreeMap<(u32, RotationType), RotationAssignment>,
    exceptions: BTreeMap<(NaiveDate, RotationType), Vec<RotationException>>,
}

impl RotationManager {
    /// Builds the index. Later weekly rows for the same slot are ignored;
    /// input validation rejects duplicates before a run.
    pub fn new(rotations: &[RotationAssignment], exceptions: &[RotationException]) -> Self {
        let mut weekly = BTreeMap::new();
        for row in rotations {
            weekly
                .entry((row.weekday.num_days_from_monday(), row.rotation_type))
                .or_insert_with(|| row.clone());
        }

        let mut by_date: BTreeMap<_, Vec<RotationException>> = BTreeMap::new();
        for ex in exceptions {
            by_date
                .entry((ex.date, ex.rotation_type))
                .or_default()
                .push(ex.clone());
        }

        Self {
            weekly,
            exceptions: by_date,
        }
    }

    /// Rotation type governing `event_type`, if any.
    pub fn rotation_for(event_type: EventType) -> Option<RotationType> {
        if event_type.is_rotation_governed() {
            Some(RotationType::Specialty)
        } else {
            None
        }
    }

    /// Resolves the covering employee for `rotation_type` on `date`.
    pub fn resolve(
        &self,
        date: NaiveDate,
        rotation_type: RotationType,
        prefer_backup: bool,
    ) -> Option<EmployeeId> {
        let exceptions = self.exceptions_for(date, rotation_type);
        if let Some(replacement) = exceptions.iter().find_map(|ex| ex.replacement.clone()) {
            return Some(replacement);
        }

        let row = self.weekly_row(date, rotation_type)?;
        let removed =
            |id: &&EmployeeId| exceptions.iter().any(|ex| ex.removed.as_ref() == Some(*id));
        let primary = Some(&row.primary).filter(|p| !removed(p));
        let backup = row.backup.as_ref().filter(|b| !removed(b));

        let picked = if prefer_backup {
            backup.or(primary)
        } else {
            primary.or(backup)
        };
        picked.cloned()
    }

    /// The lead of the day: resolved `Lead` rotation employee.
    pub fn lead_of_day(&self, date: NaiveDate) -> Option<EmployeeId> {
        self.resolve(date, RotationType::Lead, false)
    }

    /// Employees taken off `rotation_type` on `date` by removal exceptions.
    ///
    /// The fallback pool must not use them for that rotation's work.
    pub fn removed(&self, date: NaiveDate, rotation_type: RotationType) -> Vec<EmployeeId> {
        self.exceptions_for(date, rotation_type)
            .iter()
            .filter_map(|ex| ex.removed.clone())
            .collect()
    }

    /// Rotation employees to try on `date`, in order: the resolved employee,
    /// then the other of primary/backup if still eligible. Empty when nobody
    /// is on the rotation.
    pub fn candidates(&self, date: NaiveDate, rotation_type: RotationType) -> Vec<EmployeeId> {
        let mut out = Vec::new();
        if let Some(first) = self.resolve(date, rotation_type, false) {
            out.push(first);
        }
        if let Some(second) = self.resolve(date, rotation_type, true) {
            if !out.contains(&second) {
                out.push(second);
            }
        }
        out
    }

    fn weekly_row(
        &self,
        date: NaiveDate,
        rotation_type: RotationType,
    ) -> Option<&RotationAssignment> {
        self.weekly
            .get(&(date.weekday().num_days_from_monday(), rotation_type))
    }

    fn exceptions_for(&self, date: NaiveDate, rotation_type: RotationType) -> &[RotationException] {
        self.exceptions
            .get(&(date, rotation_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
