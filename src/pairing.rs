//! Primary/companion event pairing.
//!
//! Some primaries require a same-day companion: a `Supervision` check for a
//! `Production` event (loosely coupled, any role-appropriate employee) or a
//! `RotationSurvey` for a `RotationProduction` event (tightly coupled, same
//! employee at a fixed offset).
//!
//! # Matching
//!
//! 1. Explicit `pair_with` links, in companion ID order.
//! 2. Reference-number keys ([`PairKey`]) for the remaining companions, in
//!    companion ID order; among several matching primaries the lowest ID wins.
//!
//! Pairing is one-to-one. A companion that names no existing primary of the
//! right type, or whose primary is already claimed, is an orphan. Orphans are
//! reported, never repaired.
//!
//! # Transactions
//!
//! [`PairingResolver::plan`] places a primary and its companions as one unit:
//! either every part validates against the run state or nothing is placed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDateTime, TimeDelta};

use crate::config::SchedulerConfig;
use crate::models::{
    Assignment, Coupling, Employee, EventId, Role, Violation, ViolationKind, WorkEvent,
};
use crate::scheduler::Roster;
use crate::validator::ConstraintValidator;

/// Primary ↔ companion links of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingIndex {
    primary_of: BTreeMap<EventId, EventId>,
    companions_of: BTreeMap<EventId, Vec<EventId>>,
    orphans: BTreeSet<EventId>,
}

impl PairingIndex {
    /// Links every companion event in `events` to its primary.
    pub fn build(events: &[WorkEvent], config: &SchedulerConfig) -> Self {
        let by_id: BTreeMap<&str, &WorkEvent> = events.iter().map(|e| (e.id.as_str(), e)).collect();
        let mut index = Self::default();

        let companions: Vec<&WorkEvent> = by_id
            .values()
            .copied()
            .filter(|e| e.event_type.is_companion())
            .collect();

        for companion in companions.iter().filter(|c| c.pair_with.is_some()) {
            let primary = companion
                .pair_with
                .as_deref()
                .and_then(|id| by_id.get(id))
                .filter(|p| Some(p.event_type) == companion.event_type.primary_type());
            match primary {
                Some(p) if !index.companions_of.contains_key(&p.id) => {
                    index.link(&p.id, &companion.id)
                }
                _ => {
                    index.orphans.insert(companion.id.clone());
                }
            }
        }

        for companion in companions.iter().filter(|c| c.pair_with.is_none()) {
            let key = config.pair_key(companion.event_type);
            let primary_type = companion.event_type.primary_type();
            let primary = by_id.values().find(|p| {
                Some(p.event_type) == primary_type
                    && companion.reference != 0
                    && p.reference != 0
                    && key.is_some_and(|k| k.matches(p.reference, companion.reference))
                    && !index.companions_of.contains_key(&p.id)
            });
            match primary {
                Some(p) => index.link(&p.id, &companion.id),
                None => {
                    index.orphans.insert(companion.id.clone());
                }
            }
        }

        index
    }

    fn link(&mut self, primary: &str, companion: &str) {
        self.primary_of.insert(companion.to_string(), primary.to_string());
        self.companions_of
            .entry(primary.to_string())
            .or_default()
            .push(companion.to_string());
    }

    /// Primary of a linked companion.
    pub fn primary_of(&self, companion: &str) -> Option<&EventId> {
        self.primary_of.get(companion)
    }

    /// Companions a primary must be placed with.
    pub fn companions_of(&self, primary: &str) -> &[EventId] {
        self.companions_of
            .get(primary)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `a` and `b` are a linked primary/companion pair (either order).
    pub fn is_pair(&self, a: &str, b: &str) -> bool {
        self.primary_of(a).is_some_and(|p| p == b) || self.primary_of(b).is_some_and(|p| p == a)
    }

    /// Companions without a resolvable primary, by ID.
    pub fn orphans(&self) -> &BTreeSet<EventId> {
        &self.orphans
    }

    /// Whether `event_id` is an orphan companion.
    pub fn is_orphan(&self, event_id: &str) -> bool {
        self.orphans.contains(event_id)
    }
}

/// Result of planning a primary together with its companions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairPlan {
    /// All parts fit; place every assignment in one ledger transaction.
    Ready(Vec<Assignment>),
    /// The primary fits alone but a companion does not.
    CompanionBlocked {
        /// Companion that could not be placed.
        companion: EventId,
        /// Violations of the last companion candidate tried.
        violations: Vec<Violation>,
    },
}

/// Plans companions alongside their primaries.
#[derive(Debug)]
pub struct PairingResolver<'s> {
    index: &'s PairingIndex,
    config: &'s SchedulerConfig,
    events: &'s BTreeMap<&'s str, &'s WorkEvent>,
    employees: &'s [Employee],
}

impl<'s> PairingResolver<'s> {
    /// Creates a resolver over a run's events and employees.
    pub fn new(
        index: &'s PairingIndex,
        config: &'s SchedulerConfig,
        events: &'s BTreeMap<&'s str, &'s WorkEvent>,
        employees: &'s [Employee],
    ) -> Self {
        Self {
            index,
            config,
            events,
            employees,
        }
    }

    /// The pairing index.
    pub fn index(&self) -> &PairingIndex {
        self.index
    }

    /// Start time of a companion given its primary's placement.
    pub fn companion_time(
        &self,
        companion: &WorkEvent,
        primary_at: NaiveDateTime,
    ) -> NaiveDateTime {
        match companion.event_type.coupling() {
            Some(Coupling::Tight) => {
                primary_at + TimeDelta::minutes(i64::from(self.config.survey_offset_minutes))
            }
            _ => primary_at
                .date()
                .and_time(self.config.times.for_type(companion.event_type)),
        }
    }

    /// Companion staffing candidates, best first.
    ///
    /// Tight: only the primary's employee. Loose: supervisors, then the lead
    /// of the day, then every other eligible employee by role rank and ID.
    pub fn companion_candidates(
        &self,
        companion: &WorkEvent,
        primary_employee: &str,
        lead_of_day: Option<&str>,
    ) -> Vec<&'s Employee> {
        match companion.event_type.coupling() {
            Some(Coupling::Tight) => self
                .employees
                .iter()
                .filter(|e| e.id == primary_employee)
                .collect(),
            _ => {
                let mut pool: Vec<&Employee> = self
                    .employees
                    .iter()
                    .filter(|e| e.active && e.can_work(companion.event_type))
                    .collect();
                pool.sort_by_key(|e| {
                    let tier = if e.role == Role::Supervisor {
                        0
                    } else if Some(e.id.as_str()) == lead_of_day {
                        1
                    } else {
                        2
                    };
                    (tier, e.role.candidate_rank(companion.event_type), e.id.clone())
                });
                pool
            }
        }
    }

    /// Plans `primary` placed as `primary_assignment` together with all its
    /// companions, validated against `roster` minus `excluded`.
    ///
    /// Each companion is validated with the primary and earlier companions
    /// already tentatively placed, so the unit as a whole is consistent.
    pub fn plan(
        &self,
        validator: &ConstraintValidator<'_>,
        roster: &Roster,
        excluded: &BTreeSet<EventId>,
        primary: &WorkEvent,
        primary_assignment: Assignment,
        lead_of_day: Option<&str>,
    ) -> PairPlan {
        let companions = self.index.companions_of(&primary.id);
        if companions.is_empty() {
            return PairPlan::Ready(vec![primary_assignment]);
        }

        let mut tentative = roster.clone();
        tentative.insert(primary_assignment.clone());
        let mut placed = vec![primary_assignment.clone()];

        for companion_id in companions {
            let Some(companion) = self.events.get(companion_id.as_str()).copied() else {
                continue;
            };
            match self.place_companion(
                validator,
                &tentative,
                excluded,
                companion,
                &primary_assignment,
                lead_of_day,
            ) {
                Ok(assignment) => {
                    tentative.insert(assignment.clone());
                    placed.push(assignment);
                }
                Err(violations) => {
                    return PairPlan::CompanionBlocked {
                        companion: companion.id.clone(),
                        violations,
                    }
                }
            }
        }
        PairPlan::Ready(placed)
    }

    /// Staffs one companion next to an already placed primary.
    ///
    /// Returns the violations of the last candidate tried when nobody fits.
    pub fn place_companion(
        &self,
        validator: &ConstraintValidator<'_>,
        roster: &Roster,
        excluded: &BTreeSet<EventId>,
        companion: &WorkEvent,
        primary_assignment: &Assignment,
        lead_of_day: Option<&str>,
    ) -> Result<Assignment, Vec<Violation>> {
        let primary_employee = primary_assignment.employee_id.as_deref().unwrap_or_default();
        let at = self.companion_time(companion, primary_assignment.scheduled_at);
        if at.date() != primary_assignment.date() {
            return Err(vec![Violation::new(
                ViolationKind::CompanionDayMismatch,
                format!(
                    "'{}' would start at {at}, not on {}",
                    companion.id,
                    primary_assignment.date()
                ),
            )]);
        }
        let mut last_violations = Vec::new();

        for employee in self.companion_candidates(companion, primary_employee, lead_of_day) {
            let outcome = validator.validate_excluding(companion, employee, at, roster, excluded);
            if outcome.valid {
                return Ok(Assignment::proposed(&companion.id, &employee.id, at));
            }
            last_violations = outcome.violations;
        }
        Err(last_violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PairKey;
    use crate::models::EventType;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_explicit_link_wins() {
        let events = vec![
            WorkEvent::new("P1", EventType::Production, day(3)).with_reference(606_001_001),
            WorkEvent::new("P2", EventType::Production, day(3)).with_reference(606_001_002),
            WorkEvent::new("S1", EventType::Supervision, day(3))
                .with_reference(606_001_900)
                .paired_with("P2"),
        ];
        let idx = PairingIndex::build(&events, &SchedulerConfig::default());
        assert_eq!(idx.primary_of("S1").map(String::as_str), Some("P2"));
        assert_eq!(idx.companions_of("P2"), ["S1".to_string()]);
        assert!(idx.companions_of("P1").is_empty());
        assert!(idx.is_pair("P2", "S1"));
        assert!(idx.is_pair("S1", "P2"));
        assert!(!idx.is_pair("S1", "P1"));
    }

    #[test]
    fn test_shared_prefix_lowest_id() {
        let events = vec![
            WorkEvent::new("P2", EventType::Production, day(3)).with_reference(606_001_002),
            WorkEvent::new("P1", EventType::Production, day(3)).with_reference(606_001_001),
            WorkEvent::new("S1", EventType::Supervision, day(3)).with_reference(606_001_500),
        ];
        let idx = PairingIndex::build(&events, &SchedulerConfig::default());
        assert_eq!(idx.primary_of("S1").map(String::as_str), Some("P1"));
    }

    #[test]
    fn test_offset_key() {
        let events = vec![
            WorkEvent::new("R", EventType::RotationProduction, day(3)).with_reference(5000),
            WorkEvent::new("V", EventType::RotationSurvey, day(3)).with_reference(5001),
        ];
        let idx = PairingIndex::build(&events, &SchedulerConfig::default());
        assert_eq!(idx.primary_of("V").map(String::as_str), Some("R"));

        let cfg = SchedulerConfig::default().with_survey_key(PairKey::Offset(10));
        let idx = PairingIndex::build(&events, &cfg);
        assert!(idx.is_orphan("V"));
    }

    #[test]
    fn test_orphans() {
        let events = vec![
            WorkEvent::new("P1", EventType::Production, day(3)).with_reference(606_001_001),
            // Wrong primary type.
            WorkEvent::new("S1", EventType::Supervision, day(3)).paired_with("G"),
            WorkEvent::new("G", EventType::Generic, day(3)),
            // No reference at all.
            WorkEvent::new("S2", EventType::Supervision, day(3)),
            // Second companion for an already claimed primary.
            WorkEvent::new("S3", EventType::Supervision, day(3)).with_reference(606_001_111),
            WorkEvent::new("S4", EventType::Supervision, day(3)).with_reference(606_001_222),
        ];
        let idx = PairingIndex::build(&events, &SchedulerConfig::default());
        assert_eq!(idx.primary_of("S3").map(String::as_str), Some("P1"));
        let orphans: Vec<_> = idx.orphans().iter().map(String::as_str).collect();
        assert_eq!(orphans, vec!["S1", "S2", "S4"]);
    }

    #[test]
    fn test_companion_time() {
        let cfg = SchedulerConfig::default();
        let idx = PairingIndex::default();
        let events = BTreeMap::new();
        let resolver = PairingResolver::new(&idx, &cfg, &events, &[]);
        let primary_at = day(3).and_hms_opt(9, 0, 0).unwrap();

        let survey = WorkEvent::new("V", EventType::RotationSurvey, day(3));
        assert_eq!(
            resolver.companion_time(&survey, primary_at),
            day(3).and_hms_opt(17, 0, 0).unwrap()
        );
        let sup = WorkEvent::new("S", EventType::Supervision, day(3));
        assert_eq!(
            resolver.companion_time(&sup, primary_at),
            day(3).and_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_loose_candidate_order() {
        let employees = vec![
            Employee::new("A-lead", Role::Lead),
            Employee::new("B-lead", Role::Lead),
            Employee::new("Z-sup", Role::Supervisor),
            Employee::new("spec", Role::Specialist),
        ];
        let cfg = SchedulerConfig::default();
        let idx = PairingIndex::default();
        let events = BTreeMap::new();
        let resolver = PairingResolver::new(&idx, &cfg, &events, &employees);
        let sup = WorkEvent::new("S", EventType::Supervision, day(3));

        let ids: Vec<_> = resolver
            .companion_candidates(&sup, "spec", Some("B-lead"))
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["Z-sup", "B-lead", "A-lead"]);

        let survey = WorkEvent::new("V", EventType::RotationSurvey, day(3));
        let ids: Vec<_> = resolver
            .companion_candidates(&survey, "spec", None)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["spec"]);
    }
}
