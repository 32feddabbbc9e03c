//! Index of active assignments during a run.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, TimeDelta};

use crate::models::{week_start, Assignment, EmployeeId, EventId};

/// Active (proposed or committed) assignments, indexed by event and by
/// employee-day.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_event: BTreeMap<EventId, Assignment>,
    by_employee_day: BTreeMap<(EmployeeId, NaiveDate), BTreeSet<EventId>>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active assignment, replacing any previous one for the event.
    pub fn insert(&mut self, assignment: Assignment) {
        self.remove(&assignment.event_id);
        if let Some(employee) = &assignment.employee_id {
            self.by_employee_day
                .entry((employee.clone(), assignment.date()))
                .or_default()
                .insert(assignment.event_id.clone());
        }
        self.by_event.insert(assignment.event_id.clone(), assignment);
    }

    /// Removes and returns the active assignment of `event_id`.
    pub fn remove(&mut self, event_id: &str) -> Option<Assignment> {
        let removed = self.by_event.remove(event_id)?;
        if let Some(employee) = &removed.employee_id {
            let key = (employee.clone(), removed.date());
            if let Some(events) = self.by_employee_day.get_mut(&key) {
                events.remove(event_id);
                if events.is_empty() {
                    self.by_employee_day.remove(&key);
                }
            }
        }
        Some(removed)
    }

    /// Active assignment of `event_id`.
    pub fn get(&self, event_id: &str) -> Option<&Assignment> {
        self.by_event.get(event_id)
    }

    /// Mutable access, for block finalization. Date and employee must not change.
    pub(crate) fn get_mut(&mut self, event_id: &str) -> Option<&mut Assignment> {
        self.by_event.get_mut(event_id)
    }

    /// Whether `event_id` is currently placed.
    pub fn contains(&self, event_id: &str) -> bool {
        self.by_event.contains_key(event_id)
    }

    /// Assignments of `employee_id` on `date`, ordered by event ID.
    pub fn on_day<'r>(
        &'r self,
        employee_id: &str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'r Assignment> + 'r {
        self.by_employee_day
            .get(&(employee_id.to_string(), date))
            .into_iter()
            .flatten()
            .filter_map(move |id| self.by_event.get(id))
    }

    /// Assignments of `employee_id` in the Sunday–Saturday week of `date`.
    pub fn in_week<'r>(
        &'r self,
        employee_id: &'r str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'r Assignment> + 'r {
        let sunday = week_start(date);
        (0..7).flat_map(move |offset| self.on_day(employee_id, sunday + TimeDelta::days(offset)))
    }

    /// All active assignments, ordered by event ID.
    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.by_event.values()
    }

    /// Dates with at least one assignment, ascending.
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.by_employee_day.keys().map(|(_, date)| *date).collect()
    }

    /// Number of active assignments.
    pub fn len(&self) -> usize {
        self.by_event.len()
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.by_event.is_empty()
    }
}
