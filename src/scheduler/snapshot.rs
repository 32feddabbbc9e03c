//! Immutable input snapshot for one scheduling run.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::availability::{AlwaysAvailable, AvailabilityResolver};
use crate::models::{
    Assignment, Employee, RotationAssignment, RotationException, ShiftBlockConfig, WorkEvent,
};

static ALWAYS_AVAILABLE: AlwaysAvailable = AlwaysAvailable;

/// Everything a run reads, fixed for the run's duration.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_roster::models::{Employee, EventType, Role, WorkEvent};
/// use u_roster::scheduler::ScheduleSnapshot;
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let day = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
/// let snapshot = ScheduleSnapshot::new(today)
///     .with_events(vec![WorkEvent::new("EV1", EventType::Generic, day)])
///     .with_employees(vec![Employee::new("E1", Role::Specialist)]);
/// assert_eq!(snapshot.events.len(), 1);
/// ```
#[derive(Clone)]
pub struct ScheduleSnapshot<'a> {
    /// Reference date of the run.
    pub today: NaiveDate,
    /// Events; those without an active committed assignment are pending.
    pub events: Vec<WorkEvent>,
    /// Employees.
    pub employees: Vec<Employee>,
    /// Resolved availability.
    pub availability: &'a dyn AvailabilityResolver,
    /// Weekly rotation rows.
    pub rotations: Vec<RotationAssignment>,
    /// One-off rotation overrides.
    pub exceptions: Vec<RotationException>,
    /// Arrival blocks.
    pub shift_blocks: ShiftBlockConfig,
    /// Dates no assignment may target.
    pub locked_dates: BTreeSet<NaiveDate>,
    /// Company-wide holidays.
    pub holidays: BTreeSet<NaiveDate>,
    /// Assignments committed by earlier runs.
    pub committed: Vec<Assignment>,
}

impl<'a> ScheduleSnapshot<'a> {
    /// Creates an empty snapshot where everyone is available.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            events: Vec::new(),
            employees: Vec::new(),
            availability: &ALWAYS_AVAILABLE,
            rotations: Vec::new(),
            exceptions: Vec::new(),
            shift_blocks: ShiftBlockConfig::default(),
            locked_dates: BTreeSet::new(),
            holidays: BTreeSet::new(),
            committed: Vec::new(),
        }
    }

    /// Sets the events.
    pub fn with_events(mut self, events: Vec<WorkEvent>) -> Self {
        self.events = events;
        self
    }

    /// Sets the employees.
    pub fn with_employees(mut self, employees: Vec<Employee>) -> Self {
        self.employees = employees;
        self
    }

    /// Sets the availability resolver.
    pub fn with_availability(mut self, availability: &'a dyn AvailabilityResolver) -> Self {
        self.availability = availability;
        self
    }

    /// Sets the weekly rotation rows.
    pub fn with_rotations(mut self, rotations: Vec<RotationAssignment>) -> Self {
        self.rotations = rotations;
        self
    }

    /// Sets the rotation exceptions.
    pub fn with_exceptions(mut self, exceptions: Vec<RotationException>) -> Self {
        self.exceptions = exceptions;
        self
    }

    /// Sets the shift block configuration.
    pub fn with_shift_blocks(mut self, shift_blocks: ShiftBlockConfig) -> Self {
        self.shift_blocks = shift_blocks;
        self
    }

    /// Adds a locked date.
    pub fn with_locked_date(mut self, date: NaiveDate) -> Self {
        self.locked_dates.insert(date);
        self
    }

    /// Adds a company holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Sets the committed assignments.
    pub fn with_committed(mut self, committed: Vec<Assignment>) -> Self {
        self.committed = committed;
        self
    }

    /// Looks up an event by ID.
    pub fn event(&self, id: &str) -> Option<&WorkEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Looks up an employee by ID.
    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }
}

impl std::fmt::Debug for ScheduleSnapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleSnapshot")
            .field("today", &self.today)
            .field("events", &self.events.len())
            .field("employees", &self.employees.len())
            .field("rotations", &self.rotations.len())
            .field("exceptions", &self.exceptions.len())
            .field("locked_dates", &self.locked_dates)
            .field("holidays", &self.holidays)
            .field("committed", &self.committed.len())
            .finish()
    }
}
