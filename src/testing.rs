//! Shared test fixtures.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Weekday};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::availability::AvailabilityTable;
use crate::models::{
    Employee, EventType, Role, RotationAssignment, RotationException, RotationType, WorkEvent,
};
use crate::scheduler::ScheduleSnapshot;

/// March 2026: the 1st is a Sunday, so weeks run 1-7, 8-14, ...
pub(crate) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

pub(crate) fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).unwrap()
}

/// Production event with a window.
pub(crate) fn production(id: &str, start: u32, due: u32) -> WorkEvent {
    WorkEvent::new(id, EventType::Production, day(start)).with_window(day(start), day(due))
}

/// `n` specialists named `S01`..
pub(crate) fn specialists(n: usize) -> Vec<Employee> {
    (1..=n)
        .map(|i| Employee::new(format!("S{i:02}"), Role::Specialist))
        .collect()
}

/// Owned inputs of a randomly generated run.
pub(crate) struct RandomCase {
    pub today: NaiveDate,
    pub events: Vec<WorkEvent>,
    pub employees: Vec<Employee>,
    pub rotations: Vec<RotationAssignment>,
    pub exceptions: Vec<RotationException>,
    pub availability: AvailabilityTable,
    pub holiday: Option<NaiveDate>,
}

impl RandomCase {
    /// Generates a valid snapshot's inputs from `seed`.
    pub fn generate(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let today = day(2);

        let mut employees = Vec::new();
        for i in 0..rng.random_range(6..12) {
            let role = match rng.random_range(0..10) {
                0..=4 => Role::Specialist,
                5 | 6 => Role::Lead,
                7 | 8 => Role::RotationSpecialist,
                _ => Role::Supervisor,
            };
            let mut e = Employee::new(format!("E{i:02}"), role);
            if rng.random_bool(0.3) {
                e = e.rotation_trained();
            }
            if rng.random_bool(0.08) {
                e = e.inactive();
            }
            employees.push(e);
        }

        let rotation_pool: Vec<&Employee> = employees
            .iter()
            .filter(|e| e.can_work(EventType::RotationProduction))
            .collect();
        let leads: Vec<&Employee> = employees.iter().filter(|e| e.role == Role::Lead).collect();
        let weekdays = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];
        let mut rotations = Vec::new();
        for weekday in weekdays {
            if !rotation_pool.is_empty() && rng.random_bool(0.8) {
                let primary = rotation_pool[rng.random_range(0..rotation_pool.len())];
                let mut row =
                    RotationAssignment::new(weekday, RotationType::Specialty, &primary.id);
                if rotation_pool.len() > 1 && rng.random_bool(0.5) {
                    let backup = rotation_pool[rng.random_range(0..rotation_pool.len())];
                    if backup.id != primary.id {
                        row = row.with_backup(&backup.id);
                    }
                }
                rotations.push(row);
            }
            if !leads.is_empty() && rng.random_bool(0.8) {
                let lead = leads[rng.random_range(0..leads.len())];
                rotations.push(RotationAssignment::new(weekday, RotationType::Lead, &lead.id));
            }
        }

        let mut exceptions = Vec::new();
        // At most one exception per date.
        for k in 0..rng.random_range(0..4) {
            let date = today + TimeDelta::days(1 + 3 * k + rng.random_range(0..3));
            let who = &employees[rng.random_range(0..employees.len())].id;
            let ex = if rng.random_bool(0.5) {
                RotationException::remove(date, RotationType::Specialty, who)
            } else {
                RotationException::replace(date, RotationType::Specialty, who)
            };
            exceptions.push(ex);
        }

        let mut availability = AvailabilityTable::new();
        for e in &employees {
            if rng.random_bool(0.4) {
                let off = weekdays[rng.random_range(0..weekdays.len())];
                availability = availability.with_weekly_off(&e.id, off);
            }
            if rng.random_bool(0.2) {
                let from = today + TimeDelta::days(rng.random_range(1..12));
                let to = from + TimeDelta::days(rng.random_range(0..3));
                availability = availability.with_time_off(&e.id, from, to);
            }
        }

        let subjects = ["coffee", "cheese", "wine"];
        let mut events = Vec::new();
        for i in 0..rng.random_range(15..40) {
            let event_type = match rng.random_range(0..20) {
                0..=8 => EventType::Production,
                9..=11 => EventType::RotationProduction,
                12 => EventType::Setup,
                13 => EventType::Refresh,
                14 => EventType::Teardown,
                _ => EventType::Generic,
            };
            let start = today + TimeDelta::days(rng.random_range(0..10));
            let due = start + TimeDelta::days(rng.random_range(0..6));
            let id = format!("EV{i:03}");
            let mut event = WorkEvent::new(&id, event_type, start)
                .with_window(start, due)
                .with_duration([30, 60, 90][rng.random_range(0..3)])
                .with_subject(subjects[rng.random_range(0..subjects.len())]);
            if rng.random_bool(0.05) {
                event = event.locked();
            }
            events.push(event);

            let companion = match event_type {
                EventType::Production if rng.random_bool(0.4) => Some(EventType::Supervision),
                EventType::RotationProduction if rng.random_bool(0.5) => {
                    Some(EventType::RotationSurvey)
                }
                _ => None,
            };
            if let Some(companion_type) = companion {
                events.push(
                    WorkEvent::new(format!("{id}-C"), companion_type, start)
                        .with_window(start, due)
                        .paired_with(&id),
                );
            }
        }

        let holiday = rng
            .random_bool(0.3)
            .then(|| today + TimeDelta::days(rng.random_range(1..14)));

        Self {
            today,
            events,
            employees,
            rotations,
            exceptions,
            availability,
            holiday,
        }
    }

    /// Snapshot borrowing this case.
    pub fn snapshot(&self) -> ScheduleSnapshot<'_> {
        let mut snapshot = ScheduleSnapshot::new(self.today)
            .with_events(self.events.clone())
            .with_employees(self.employees.clone())
            .with_availability(&self.availability)
            .with_rotations(self.rotations.clone())
            .with_exceptions(self.exceptions.clone());
        if let Some(holiday) = self.holiday {
            snapshot = snapshot.with_holiday(holiday);
        }
        snapshot
    }
}
