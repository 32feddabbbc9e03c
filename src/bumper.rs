//! Conflict resolution by displacement ("bumping").
//!
//! When an event's only obstacles are bumpable violations (quota, overlap),
//! the resolver looks for one less urgent assignment whose removal, together
//! with its companions, makes a candidate valid.
//!
//! # Victim Eligibility
//!
//! - not a companion (companions move only with their primary)
//! - not a locked event
//! - not due within `protected_window_days` of today
//! - strictly less urgent: greater [`UrgencyKey`] than the bumping event
//! - displaced fewer than `max_bumps` times so far
//!
//! # Search Order
//!
//! Candidates in the order given (dates ascending, then ranked employees);
//! per candidate, victims least urgent first, then by event ID. The first
//! victim that cures the candidate wins.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::models::{Assignment, Employee, EventId, WorkEvent};
use crate::ordering::UrgencyKey;
use crate::pairing::{PairPlan, PairingResolver};
use crate::rotation::RotationManager;
use crate::scheduler::Roster;
use crate::validator::{ConstraintValidator, ValidationOutcome};

/// A candidate that failed only on bumpable constraints.
#[derive(Debug, Clone)]
pub struct BumpCandidate<'s> {
    /// Candidate employee.
    pub employee: &'s Employee,
    /// Candidate start.
    pub at: NaiveDateTime,
    /// Its validation outcome.
    pub outcome: ValidationOutcome,
}

/// A displacement that makes room for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpPlan {
    /// The assignment chosen for displacement.
    pub victim: EventId,
    /// Every event displaced: the victim and its placed companions.
    pub displaced: Vec<EventId>,
    /// Assignments for the bumping event and its companions.
    pub placements: Vec<Assignment>,
}

/// Selects displaceable assignments.
#[derive(Debug)]
pub struct ConflictResolver<'s> {
    config: &'s SchedulerConfig,
    today: NaiveDate,
}

impl<'s> ConflictResolver<'s> {
    /// Creates a resolver for a run on `today`.
    pub fn new(config: &'s SchedulerConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    /// Last due date still inside the protected near-term window.
    pub fn protected_until(&self) -> NaiveDate {
        self.today + TimeDelta::days(i64::from(self.config.protected_window_days))
    }

    /// Whether `victim` may be displaced by `bumper`, having been displaced
    /// `bump_count` times already.
    pub fn is_displaceable(&self, bumper: &WorkEvent, victim: &WorkEvent, bump_count: u32) -> bool {
        !victim.event_type.is_companion()
            && !victim.locked
            && victim.due_date > self.protected_until()
            && UrgencyKey::of(victim) > UrgencyKey::of(bumper)
            && bump_count < self.config.max_bumps
    }

    /// Displaceable victims behind a candidate's bumpable violations, least
    /// urgent first, then by ID.
    pub fn victims<'v>(
        &self,
        bumper: &WorkEvent,
        outcome: &ValidationOutcome,
        validator: &ConstraintValidator<'v>,
        pairing: &PairingResolver<'_>,
        roster: &Roster,
        bump_counts: &BTreeMap<EventId, u32>,
    ) -> Vec<&'v WorkEvent> {
        let mut victims: Vec<&WorkEvent> = outcome
            .blocking()
            .into_iter()
            .map(|id| pairing.index().primary_of(&id).cloned().unwrap_or(id))
            .collect::<BTreeSet<EventId>>()
            .into_iter()
            .filter(|id| roster.contains(id))
            .filter_map(|id| validator.event(&id))
            .filter(|v| {
                let count = bump_counts.get(&v.id).copied().unwrap_or(0);
                self.is_displaceable(bumper, v, count)
            })
            .collect();

        victims.sort_by(|a, b| {
            UrgencyKey::of(b)
                .cmp(&UrgencyKey::of(a))
                .then_with(|| a.id.cmp(&b.id))
        });
        victims
    }

    /// Finds the first displacement that lets `event` be placed.
    #[allow(clippy::too_many_arguments)]
    pub fn find(
        &self,
        event: &WorkEvent,
        candidates: &[BumpCandidate<'_>],
        validator: &ConstraintValidator<'_>,
        pairing: &PairingResolver<'_>,
        rotation: &RotationManager,
        roster: &Roster,
        bump_counts: &BTreeMap<EventId, u32>,
    ) -> Option<BumpPlan> {
        for candidate in candidates {
            let victims =
                self.victims(event, &candidate.outcome, validator, pairing, roster, bump_counts);
            for victim in victims {
                let mut excluded: BTreeSet<EventId> = BTreeSet::from([victim.id.clone()]);
                excluded.extend(
                    pairing
                        .index()
                        .companions_of(&victim.id)
                        .iter()
                        .filter(|c| roster.contains(c))
                        .cloned(),
                );

                let outcome = validator.validate_excluding(
                    event,
                    candidate.employee,
                    candidate.at,
                    roster,
                    &excluded,
                );
                if !outcome.valid {
                    continue;
                }

                let lead = rotation.lead_of_day(candidate.at.date());
                let primary = Assignment::proposed(&event.id, &candidate.employee.id, candidate.at);
                match pairing.plan(validator, roster, &excluded, event, primary, lead.as_deref()) {
                    PairPlan::Ready(placements) => {
                        debug!(
                            event = %event.id,
                            victim = %victim.id,
                            employee = %candidate.employee.id,
                            date = %candidate.at.date(),
                            "displacement found"
                        );
                        return Some(BumpPlan {
                            victim: victim.id.clone(),
                            displaced: excluded.into_iter().collect(),
                            placements,
                        });
                    }
                    PairPlan::CompanionBlocked { companion, .. } => {
                        debug!(
                            event = %event.id,
                            victim = %victim.id,
                            %companion,
                            "displacement leaves companion blocked"
                        );
                    }
                }
            }
        }
        None
    }
}
