//! Per-candidate constraint validation.
//!
//! Answers "may `employee` work `event` at `at`, given what is already
//! placed?" with every violation found, each tagged [`ConstraintClass::Hard`]
//! or [`ConstraintClass::Bumpable`]. Checks never short-circuit, so callers
//! can tell a bumpable-only rejection from a hard one.
//!
//! # Check Order
//!
//! | # | Check | Kind | Class |
//! |---|-------|------|-------|
//! | 1 | employee active | `EmployeeInactive` | Hard |
//! | 2 | company holiday | `CompanyHoliday` | Hard |
//! | 3 | time off | `TimeOff` | Hard |
//! | 4 | resolved availability | `Unavailable` | Hard |
//! | 5 | role eligibility | `RoleIneligible` | Hard |
//! | 6 | daily production quota | `DailyQuota` | Bumpable |
//! | 7 | weekly production quota | `WeeklyQuota` | Bumpable |
//! | 8 | same-day overlap | `Overlap` | Bumpable |
//! | 9 | event window | `AfterDueDate` / `BeforeStartDate` | Hard |
//! | 10 | locked date | `LockedDate` | Hard |
//!
//! # Occupied Time
//!
//! A block-governed event whose block is not yet finalized occupies its whole
//! arrival envelope, so finalizing blocks later can never create an overlap.
//!
//! [`ConstraintClass::Hard`]: crate::models::ConstraintClass::Hard
//! [`ConstraintClass::Bumpable`]: crate::models::ConstraintClass::Bumpable

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::models::{
    Assignment, AssignmentStatus, Employee, EventId, Interval, Violation, ViolationKind, WorkEvent,
};
use crate::pairing::PairingIndex;
use crate::scheduler::{Roster, ScheduleSnapshot};

/// Result of validating one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether no constraint is violated.
    pub valid: bool,
    /// All violations, in check order.
    pub violations: Vec<Violation>,
}

impl ValidationOutcome {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    /// Whether the candidate failed, but only on bumpable constraints.
    pub fn is_bumpable_only(&self) -> bool {
        !self.valid && self.violations.iter().all(Violation::is_bumpable)
    }

    /// Whether any violation is hard.
    pub fn has_hard(&self) -> bool {
        self.violations.iter().any(|v| !v.is_bumpable())
    }

    /// Events whose assignments cause the bumpable violations.
    pub fn blocking(&self) -> BTreeSet<EventId> {
        self.violations
            .iter()
            .flat_map(|v| v.blocking.iter().cloned())
            .collect()
    }
}

/// Validates (event, employee, datetime) candidates against a snapshot and
/// the current run state.
pub struct ConstraintValidator<'s> {
    snapshot: &'s ScheduleSnapshot<'s>,
    config: &'s SchedulerConfig,
    pairing: &'s PairingIndex,
    events: BTreeMap<&'s str, &'s WorkEvent>,
}

impl<'s> ConstraintValidator<'s> {
    /// Creates a validator.
    pub fn new(
        snapshot: &'s ScheduleSnapshot<'s>,
        config: &'s SchedulerConfig,
        pairing: &'s PairingIndex,
    ) -> Self {
        let events = snapshot.events.iter().map(|e| (e.id.as_str(), e)).collect();
        Self {
            snapshot,
            config,
            pairing,
            events,
        }
    }

    /// Validates a candidate against everything in `roster`.
    pub fn validate(
        &self,
        event: &WorkEvent,
        employee: &Employee,
        at: NaiveDateTime,
        roster: &Roster,
    ) -> ValidationOutcome {
        self.validate_excluding(event, employee, at, roster, &BTreeSet::new())
    }

    /// Validates a candidate as if the assignments of `excluded` were removed.
    pub fn validate_excluding(
        &self,
        event: &WorkEvent,
        employee: &Employee,
        at: NaiveDateTime,
        roster: &Roster,
        excluded: &BTreeSet<EventId>,
    ) -> ValidationOutcome {
        let date = at.date();
        let mut violations = Vec::new();

        if !employee.active {
            violations.push(Violation::new(
                ViolationKind::EmployeeInactive,
                format!("Employee '{}' is inactive", employee.id),
            ));
        }

        if self.snapshot.holidays.contains(&date) {
            violations.push(Violation::new(
                ViolationKind::CompanyHoliday,
                format!("{date} is a company holiday"),
            ));
        }

        let available = self.snapshot.availability.is_available(&employee.id, date);
        if !available && self.snapshot.availability.has_time_off(&employee.id, date) {
            violations.push(Violation::new(
                ViolationKind::TimeOff,
                format!("Employee '{}' has time off on {date}", employee.id),
            ));
        } else if !available {
            violations.push(Violation::new(
                ViolationKind::Unavailable,
                format!("Employee '{}' is unavailable on {date}", employee.id),
            ));
        }

        if !employee.can_work(event.event_type) {
            violations.push(Violation::new(
                ViolationKind::RoleIneligible,
                format!("{:?} may not work {:?} events", employee.role, event.event_type),
            ));
        }

        let others = |assignments: Vec<&Assignment>| -> Vec<EventId> {
            assignments
                .into_iter()
                .filter(|a| a.event_id != event.id && !excluded.contains(&a.event_id))
                .map(|a| a.event_id.clone())
                .collect()
        };

        if event.event_type.is_quota_counted() {
            if !employee.role.is_quota_exempt() {
                let today: Vec<&Assignment> = roster
                    .on_day(&employee.id, date)
                    .filter(|a| self.is_quota_counted(a))
                    .collect();
                let held = others(today);
                if held.len() >= self.config.daily_production_limit as usize {
                    violations.push(
                        Violation::new(
                            ViolationKind::DailyQuota,
                            format!(
                                "Employee '{}' already has {} production event(s) on {date}",
                                employee.id,
                                held.len()
                            ),
                        )
                        .with_blocking(held),
                    );
                }
            }

            let week: Vec<&Assignment> = roster
                .in_week(&employee.id, date)
                .filter(|a| self.is_quota_counted(a))
                .collect();
            let held = others(week);
            if held.len() >= self.config.weekly_production_limit as usize {
                violations.push(
                    Violation::new(
                        ViolationKind::WeeklyQuota,
                        format!(
                            "Employee '{}' already has {} production event(s) in week {date}",
                            employee.id,
                            held.len()
                        ),
                    )
                    .with_blocking(held),
                );
            }
        }

        if let Some(span) = self.candidate_span(event, at) {
            let clashing: Vec<&Assignment> = roster
                .on_day(&employee.id, date)
                .filter(|a| !self.pairing.is_pair(&event.id, &a.event_id))
                .filter(|a| self.occupied(a).is_some_and(|o| o.overlaps(&span)))
                .collect();
            let clashing = others(clashing);
            if !clashing.is_empty() {
                violations.push(
                    Violation::new(
                        ViolationKind::Overlap,
                        format!(
                            "Overlaps {} of employee '{}' on {date}",
                            clashing.join(", "),
                            employee.id
                        ),
                    )
                    .with_blocking(clashing),
                );
            }
        }

        if date > event.due_date {
            violations.push(Violation::new(
                ViolationKind::AfterDueDate,
                format!("{date} is after due date {} of '{}'", event.due_date, event.id),
            ));
        }
        if date < event.start_date {
            violations.push(Violation::new(
                ViolationKind::BeforeStartDate,
                format!("{date} is before start date {} of '{}'", event.start_date, event.id),
            ));
        }

        if self.snapshot.locked_dates.contains(&date) {
            violations.push(Violation::new(
                ViolationKind::LockedDate,
                format!("{date} is locked"),
            ));
        }

        ValidationOutcome::from_violations(violations)
    }

    /// Time a not-yet-placed candidate would occupy.
    fn candidate_span(&self, event: &WorkEvent, at: NaiveDateTime) -> Option<Interval> {
        if event.event_type.is_block_governed() {
            self.snapshot
                .shift_blocks
                .envelope(at.date(), event.duration_minutes)
        } else {
            Some(Interval::from_minutes(at, event.duration_minutes))
        }
    }

    /// Time an existing assignment occupies.
    ///
    /// Proposed block-governed work without a finalized block occupies its
    /// envelope; everything else occupies `[scheduled_at, +duration)`.
    pub fn occupied(&self, assignment: &Assignment) -> Option<Interval> {
        let event = self.events.get(assignment.event_id.as_str())?;
        if event.event_type.is_block_governed()
            && assignment.status == AssignmentStatus::Proposed
            && assignment.shift_block.is_none()
        {
            self.snapshot
                .shift_blocks
                .envelope(assignment.date(), event.duration_minutes)
        } else {
            Some(Interval::from_minutes(assignment.scheduled_at, event.duration_minutes))
        }
    }

    fn is_quota_counted(&self, assignment: &Assignment) -> bool {
        self.events
            .get(assignment.event_id.as_str())
            .is_some_and(|e| e.event_type.is_quota_counted())
    }

    /// Looks up a snapshot event.
    pub fn event(&self, id: &str) -> Option<&'s WorkEvent> {
        self.events.get(id).copied()
    }
}

impl std::fmt::Debug for ConstraintValidator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintValidator")
            .field("events", &self.events.len())
            .field("daily_limit", &self.config.daily_production_limit)
            .field("weekly_limit", &self.config.weekly_production_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::AvailabilityTable;
    use crate::models::{ConstraintClass, EventType, Role};
    use chrono::{NaiveDate, Weekday};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, m, 0).unwrap()
    }

    fn events() -> Vec<WorkEvent> {
        vec![
            WorkEvent::new("P1", EventType::Production, day(3)).with_window(day(2), day(6)),
            WorkEvent::new("P2", EventType::Production, day(3)).with_window(day(2), day(6)),
            WorkEvent::new("S1", EventType::Supervision, day(3))
                .with_window(day(2), day(6))
                .with_duration(30)
                .paired_with("P1"),
            WorkEvent::new("G1", EventType::Generic, day(3)).with_window(day(2), day(6)),
            WorkEvent::new("G2", EventType::Generic, day(3)).with_window(day(2), day(6)),
        ]
    }

    fn kinds(outcome: &ValidationOutcome) -> Vec<ViolationKind> {
        outcome.violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn test_valid_candidate() {
        let snap = ScheduleSnapshot::new(day(1)).with_events(events());
        let cfg = SchedulerConfig::default();
        let pairing = PairingIndex::build(&snap.events, &cfg);
        let v = ConstraintValidator::new(&snap, &cfg, &pairing);
        let emp = Employee::new("E1", Role::Specialist);

        let out = v.validate(&snap.events[0], &emp, at(3, 9, 45), &Roster::new());
        assert!(out.valid);
        assert!(out.violations.is_empty());
    }

    #[test]
    fn test_hard_checks_collected_in_order() {
        let table = AvailabilityTable::new().with_time_off("E1", day(7), day(7));
        let snap = ScheduleSnapshot::new(day(1))
            .with_events(events())
            .with_availability(&table)
            .with_holiday(day(7))
            .with_locked_date(day(7));
        let cfg = SchedulerConfig::default();
        let pairing = PairingIndex::build(&snap.events, &cfg);
        let v = ConstraintValidator::new(&snap, &cfg, &pairing);
        let emp = Employee::new("E1", Role::Specialist).inactive();

        let supervision = &snap.events[2];
        let out = v.validate(supervision, &emp, at(7, 12, 0), &Roster::new());
        assert!(!out.valid);
        assert!(out.has_hard());
        assert!(!out.is_bumpable_only());
        assert_eq!(
            kinds(&out),
            vec![
                ViolationKind::EmployeeInactive,
                ViolationKind::CompanyHoliday,
                ViolationKind::TimeOff,
                ViolationKind::RoleIneligible,
                ViolationKind::AfterDueDate,
                ViolationKind::LockedDate,
            ]
        );
        assert!(out.violations.iter().all(|v| v.class == ConstraintClass::Hard));
    }

    #[test]
    fn test_unavailable_and_before_start() {
        let table = AvailabilityTable::new().with_weekly_off("E1", Weekday::Sun);
        let snap = ScheduleSnapshot::new(day(1))
            .with_events(events())
            .with_availability(&table);
        let cfg = SchedulerConfig::default();
        let pairing = PairingIndex::build(&snap.events, &cfg);
        let v = ConstraintValidator::new(&snap, &cfg, &pairing);
        let emp = Employee::new("E1", Role::Specialist);

        let out = v.validate(&snap.events[3], &emp, at(1, 10, 0), &Roster::new());
        assert_eq!(
            kinds(&out),
            vec![ViolationKind::Unavailable, ViolationKind::BeforeStartDate]
        );
    }

    #[test]
    fn test_daily_quota_and_supervisor_exemption() {
        let snap = ScheduleSnapshot::new(day(1)).with_events(events());
        let cfg = SchedulerConfig::default();
        let pairing = PairingIndex::build(&snap.events, &cfg);
        let v = ConstraintValidator::new(&snap, &cfg, &pairing);

        let mut roster = Roster::new();
        roster.insert(Assignment::committed("P1", "E1", at(3, 9, 45)).with_block(1));

        let spec = Employee::new("E1", Role::Specialist);
        let out = v.validate(&snap.events[1], &spec, at(3, 9, 45), &roster);
        assert!(out.is_bumpable_only());
        assert_eq!(out.violations[0].kind, ViolationKind::DailyQuota);
        assert_eq!(out.blocking(), BTreeSet::from(["P1".to_string()]));

        // Re-validating the event's own placement does not count itself.
        let out = v.validate(&snap.events[0], &spec, at(3, 9, 45), &roster);
        assert!(out.valid);

        // As if P1 were bumped.
        let excluded = BTreeSet::from(["P1".to_string()]);
        let out = v.validate_excluding(&snap.events[1], &spec, at(3, 9, 45), &roster, &excluded);
        assert!(out.valid);

        let sup = Employee::new("SUP", Role::Supervisor);
        let mut roster = Roster::new();
        roster.insert(Assignment::committed("P1", "SUP", at(3, 8, 0)).with_block(1));
        let out = v.validate(&snap.events[1], &sup, at(3, 9, 45), &roster);
        assert!(!kinds(&out).contains(&ViolationKind::DailyQuota));
    }

    #[test]
    fn test_weekly_quota() {
        let mut evs = events();
        for d in 1..=7 {
            evs.push(WorkEvent::new(format!("W{d}"), EventType::Production, day(d)));
        }
        let snap = ScheduleSnapshot::new(day(1)).with_events(evs);
        let cfg = SchedulerConfig::default().with_weekly_production_limit(2);
        let pairing = PairingIndex::build(&snap.events, &cfg);
        let v = ConstraintValidator::new(&snap, &cfg, &pairing);
        let emp = Employee::new("E1", Role::Specialist);

        let mut roster = Roster::new();
        roster.insert(Assignment::committed("W1", "E1", at(1, 8, 0)));
        roster.insert(Assignment::committed("W2", "E1", at(2, 8, 0)));
        // Next week's assignment does not count.
        let next_week = WorkEvent::new("N", EventType::Production, day(8));
        let out = v.validate(&next_week, &emp, at(8, 9, 45), &roster);
        assert!(out.valid);

        let out = v.validate(&snap.events[0], &emp, at(4, 9, 45), &roster);
        assert_eq!(kinds(&out), vec![ViolationKind::WeeklyQuota]);
        assert_eq!(out.violations[0].blocking, vec!["W1".to_string(), "W2".to_string()]);
    }

    #[test]
    fn test_overlap_and_companion_exemption() {
        let snap = ScheduleSnapshot::new(day(1)).with_events(events());
        let cfg = SchedulerConfig::default();
        let pairing = PairingIndex::build(&snap.events, &cfg);
        let v = ConstraintValidator::new(&snap, &cfg, &pairing);
        let lead = Employee::new("L", Role::Lead);

        let mut roster = Roster::new();
        // P1 unfinalized: occupies the 09:45 to 12:30 envelope.
        roster.insert(Assignment::proposed("P1", "L", at(3, 9, 45)));

        // Its own supervision at 12:00 is exempt.
        let out = v.validate(&snap.events[2], &lead, at(3, 12, 0), &roster);
        assert!(out.valid, "{:?}", out.violations);

        // A generic task at 12:00 clashes with the envelope.
        let out = v.validate(&snap.events[3], &lead, at(3, 12, 0), &roster);
        assert_eq!(kinds(&out), vec![ViolationKind::Overlap]);
        assert_eq!(out.blocking(), BTreeSet::from(["P1".to_string()]));

        // Touching intervals do not overlap.
        let out = v.validate(&snap.events[3], &lead, at(3, 12, 30), &roster);
        assert!(out.valid);

        // Once finalized to block 1 (09:45 to 10:45), noon is free.
        roster.insert(Assignment::proposed("P1", "L", at(3, 9, 45)).with_block(1));
        let out = v.validate(&snap.events[3], &lead, at(3, 12, 0), &roster);
        assert!(out.valid);
    }

    #[test]
    fn test_overlap_between_generics() {
        let snap = ScheduleSnapshot::new(day(1)).with_events(events());
        let cfg = SchedulerConfig::default();
        let pairing = PairingIndex::build(&snap.events, &cfg);
        let v = ConstraintValidator::new(&snap, &cfg, &pairing);
        let emp = Employee::new("E1", Role::Specialist);

        let mut roster = Roster::new();
        roster.insert(Assignment::proposed("G1", "E1", at(3, 10, 0)));
        let out = v.validate(&snap.events[4], &emp, at(3, 10, 30), &roster);
        assert!(out.is_bumpable_only());
        // A different day is fine.
        let out = v.validate(&snap.events[4], &emp, at(4, 10, 30), &roster);
        assert!(out.valid);
    }
}
