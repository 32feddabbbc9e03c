//! Employee availability.
//!
//! The engine only asks a resolved yes/no question per (employee, date)
//! through [`AvailabilityResolver`]. How that answer is derived belongs to the
//! caller. [`AvailabilityTable`] is a reference resolver that reproduces the
//! documented priority chain, for callers that hold raw availability records.
//!
//! # Priority Chain
//! The first layer with an opinion decides:
//! 1. explicit override for (employee, date)
//! 2. date-specific availability for (employee, date)
//! 3. weekly pattern: a weekday marked unavailable
//! 4. time-off range covering the date
//! 5. holiday
//!
//! With no opinion from any layer, the employee is available.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::EmployeeId;

/// Resolved availability lookup supplied by the caller.
pub trait AvailabilityResolver: Send + Sync {
    /// Whether the employee can work on `date`.
    fn is_available(&self, employee_id: &str, date: NaiveDate) -> bool;

    /// Whether the employee has approved time off on `date`.
    ///
    /// Lets the validator report time off distinctly from general
    /// unavailability. Defaults to `false`.
    fn has_time_off(&self, _employee_id: &str, _date: NaiveDate) -> bool {
        false
    }
}

/// Resolver under which everyone is always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl AvailabilityResolver for AlwaysAvailable {
    fn is_available(&self, _employee_id: &str, _date: NaiveDate) -> bool {
        true
    }
}

/// Inclusive time-off range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOff {
    /// First day off.
    pub from: NaiveDate,
    /// Last day off (inclusive).
    pub to: NaiveDate,
}

/// In-memory availability records resolved through the priority chain.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityTable {
    overrides: BTreeMap<(EmployeeId, NaiveDate), bool>,
    date_specific: BTreeMap<(EmployeeId, NaiveDate), bool>,
    weekly_off: BTreeMap<EmployeeId, BTreeSet<u32>>,
    time_off: BTreeMap<EmployeeId, Vec<TimeOff>>,
    holidays: BTreeSet<NaiveDate>,
}

impl AvailabilityTable {
    /// Creates an empty table (everyone available).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a manager override, the strongest layer.
    pub fn with_override(
        mut self,
        employee_id: impl Into<EmployeeId>,
        date: NaiveDate,
        available: bool,
    ) -> Self {
        self.overrides.insert((employee_id.into(), date), available);
        self
    }

    /// Adds a date-specific availability record.
    pub fn with_date(
        mut self,
        employee_id: impl Into<EmployeeId>,
        date: NaiveDate,
        available: bool,
    ) -> Self {
        self.date_specific.insert((employee_id.into(), date), available);
        self
    }

    /// Marks a weekday as a regular day off.
    pub fn with_weekly_off(mut self, employee_id: impl Into<EmployeeId>, weekday: Weekday) -> Self {
        self.weekly_off
            .entry(employee_id.into())
            .or_default()
            .insert(weekday.num_days_from_monday());
        self
    }

    /// Adds an inclusive time-off range.
    pub fn with_time_off(
        mut self,
        employee_id: impl Into<EmployeeId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        self.time_off
            .entry(employee_id.into())
            .or_default()
            .push(TimeOff { from, to });
        self
    }

    /// Adds a holiday on which nobody is available unless overridden.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    fn key(employee_id: &str, date: NaiveDate) -> (EmployeeId, NaiveDate) {
        (employee_id.to_string(), date)
    }
}

impl AvailabilityResolver for AvailabilityTable {
    fn is_available(&self, employee_id: &str, date: NaiveDate) -> bool {
        let key = Self::key(employee_id, date);
        if let Some(&available) = self.overrides.get(&key) {
            return available;
        }
        if let Some(&available) = self.date_specific.get(&key) {
            return available;
        }
        if self
            .weekly_off
            .get(employee_id)
            .is_some_and(|days| days.contains(&date.weekday().num_days_from_monday()))
        {
            return false;
        }
        if self.has_time_off(employee_id, date) {
            return false;
        }
        !self.holidays.contains(&date)
    }

    fn has_time_off(&self, employee_id: &str, date: NaiveDate) -> bool {
        self.time_off
            .get(employee_id)
            .is_some_and(|ranges| ranges.iter().any(|r| date >= r.from && date <= r.to))
    }
}
