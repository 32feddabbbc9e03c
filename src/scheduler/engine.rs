//! Wave-driven scheduling engine.
//!
//! # Algorithm
//!
//! 1. Validate the snapshot; malformed input aborts the run.
//! 2. Fail orphan companions; staff companions of primaries committed by an
//!    earlier run.
//! 3. Order pending events into waves. Process each wave as a queue: for each
//!    event, search dates ascending and ranked employees per date; place the
//!    first valid candidate together with its companions.
//! 4. When every candidate failed and some failed only on bumpable
//!    constraints, displace one less urgent assignment. The displaced event
//!    re-enters the queue of `max(its wave, current wave)`.
//! 5. Rescue pass: failures due within `rescue_window_days` get one more try
//!    with one extra bump attempt.
//! 6. Finalize shift blocks per day in proposal order.
//!
//! Cancellation is checked after each wave, never mid-wave.
//!
//! # Complexity
//! O(n * d * e) validations for n events, d window dates, e employees, plus
//! bounded re-placements (each event is displaced at most `max_bumps` times).

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ledger::{EntryKind, RunLedger};
use super::roster::Roster;
use super::snapshot::ScheduleSnapshot;
use super::stats::RunStats;
use crate::bumper::{BumpCandidate, BumpPlan, ConflictResolver};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::models::{
    dates_between, Assignment, AssignmentStatus, Employee, EventId, FailureReason, Violation, Wave,
    WorkEvent,
};
use crate::ordering::{PriorityOrderer, UrgencyKey};
use crate::pairing::{PairPlan, PairingIndex, PairingResolver};
use crate::ranking::{rank_candidates, EmployeeRanker, RuleBasedRanker};
use crate::rotation::RotationManager;
use crate::shift_blocks::{BlockHolder, BlockRequest, ShiftBlockAllocator};
use crate::validation::validate_snapshot;
use crate::validator::ConstraintValidator;

/// Result of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRun {
    /// Final proposals, failures, and bump records for displaced committed
    /// work, ordered by event ID.
    pub assignments: Vec<Assignment>,
    /// Full append-only history of the run.
    pub ledger: RunLedger,
    /// Summary counters.
    pub stats: RunStats,
}

impl SchedulingRun {
    /// Final assignment of `event_id` with the given status.
    pub fn find(&self, event_id: &str, status: AssignmentStatus) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|a| a.event_id == event_id && a.status == status)
    }

    /// Proposed assignments.
    pub fn proposals(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Proposed)
    }

    /// Failure records.
    pub fn failures(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Failed)
    }
}

/// Outcome of placing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// The event and its companions were placed.
    Placed {
        /// New assignments, primary first.
        assignments: Vec<Assignment>,
        /// Events displaced to make room, to be placed again.
        displaced: Vec<EventId>,
    },
    /// The event could not be placed.
    Failed(Assignment),
}

/// Auto-scheduling engine.
///
/// Holds configuration and the ranking strategy only; every run keeps its
/// mutable state locally, so one engine can serve several threads.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_roster::config::SchedulerConfig;
/// use u_roster::models::{Employee, EventType, Role, WorkEvent};
/// use u_roster::scheduler::{ScheduleSnapshot, SchedulingEngine};
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let day = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
/// let snapshot = ScheduleSnapshot::new(today)
///     .with_events(vec![WorkEvent::new("EV1", EventType::Production, day)])
///     .with_employees(vec![Employee::new("E1", Role::Specialist)]);
///
/// let run = SchedulingEngine::new(SchedulerConfig::default())
///     .run(&snapshot)
///     .unwrap();
/// assert_eq!(run.stats.scheduled, 1);
/// assert_eq!(run.assignments[0].shift_block, Some(1));
/// ```
pub struct SchedulingEngine {
    config: SchedulerConfig,
    ranker: Box<dyn EmployeeRanker>,
}

impl SchedulingEngine {
    /// Creates an engine with the rule-based ranker.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            ranker: Box::new(RuleBasedRanker),
        }
    }

    /// Replaces the candidate ranker.
    pub fn with_ranker(mut self, ranker: impl EmployeeRanker + 'static) -> Self {
        self.ranker = Box::new(ranker);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs to completion.
    pub fn run(&self, snapshot: &ScheduleSnapshot<'_>) -> Result<SchedulingRun, SchedulerError> {
        self.run_with_cancel(snapshot, &AtomicBool::new(false))
    }

    /// Runs, stopping after the first wave during which `cancel` was set.
    pub fn run_with_cancel(
        &self,
        snapshot: &ScheduleSnapshot<'_>,
        cancel: &AtomicBool,
    ) -> Result<SchedulingRun, SchedulerError> {
        validate_snapshot(snapshot).map_err(SchedulerError::InvalidInput)?;
        info!(
            today = %snapshot.today,
            events = snapshot.events.len(),
            employees = snapshot.employees.len(),
            committed = snapshot.committed.len(),
            "scheduling run started"
        );

        let index = PairingIndex::build(&snapshot.events, &self.config);
        let events: BTreeMap<&str, &WorkEvent> = snapshot
            .events
            .iter()
            .map(|e| (e.id.as_str(), e))
            .collect();
        let pass = Pass {
            snapshot,
            config: &self.config,
            ranker: self.ranker.as_ref(),
            validator: ConstraintValidator::new(snapshot, &self.config, &index),
            pairing: PairingResolver::new(&index, &self.config, &events, &snapshot.employees),
            rotation: RotationManager::new(&snapshot.rotations, &snapshot.exceptions),
            orderer: PriorityOrderer::new(&self.config),
            resolver: ConflictResolver::new(&self.config, snapshot.today),
        };

        let mut state = RunState::new(snapshot);
        let pending: Vec<&WorkEvent> = snapshot
            .events
            .iter()
            .filter(|e| !state.roster.contains(&e.id))
            .collect();

        pass.fail_orphans(&pending, &mut state);
        pass.staff_committed_primaries(&pending, &mut state);

        let plan = pass.orderer.plan(pending.iter().copied(), snapshot.today);
        let mut queues: BTreeMap<Wave, VecDeque<EventId>> = plan
            .waves
            .into_iter()
            .map(|(wave, ids)| (wave, ids.into_iter().collect()))
            .collect();

        for (completed, wave) in Wave::ALL.into_iter().enumerate() {
            pass.run_wave(wave, &mut queues, &mut state);
            if cancel.load(Ordering::Relaxed) {
                info!(completed_waves = completed + 1, "scheduling run cancelled");
                return Err(SchedulerError::Cancelled {
                    completed_waves: completed + 1,
                });
            }
        }

        pass.rescue(&mut state);
        pass.finalize_blocks(&mut state);

        let assignments = pass.collect(&state);
        let stats = RunStats::calculate(&assignments, &state.ledger, state.rescued, |id| {
            events.get(id).copied()
        });
        info!(
            scheduled = stats.scheduled,
            failed = stats.failed,
            bumped = stats.bumped,
            rescued = stats.rescued,
            "scheduling run finished"
        );

        Ok(SchedulingRun {
            assignments,
            ledger: state.ledger,
            stats,
        })
    }
}

impl std::fmt::Debug for SchedulingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulingEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Mutable state of one run.
struct RunState {
    roster: Roster,
    ledger: RunLedger,
    /// Times each event has been displaced.
    bump_counts: BTreeMap<EventId, u32>,
    /// Times each event asked the resolver for a displacement.
    bump_attempts: BTreeMap<EventId, u32>,
    rescued: usize,
}

impl RunState {
    fn new(snapshot: &ScheduleSnapshot<'_>) -> Self {
        let mut roster = Roster::new();
        for a in snapshot.committed.iter().filter(|a| a.is_active()) {
            roster.insert(a.clone());
        }
        Self {
            roster,
            ledger: RunLedger::new(),
            bump_counts: BTreeMap::new(),
            bump_attempts: BTreeMap::new(),
            rescued: 0,
        }
    }
}

/// What a candidate search ran into, for picking the failure reason.
#[derive(Default)]
struct Search<'s> {
    bumpable: Vec<BumpCandidate<'s>>,
    blocked_companion: Option<(EventId, Vec<Violation>)>,
    last_violations: Vec<Violation>,
    last_at: Option<NaiveDateTime>,
    rotation_gap: bool,
    tried: usize,
}

/// Read-only collaborators of one run.
struct Pass<'s> {
    snapshot: &'s ScheduleSnapshot<'s>,
    config: &'s SchedulerConfig,
    ranker: &'s dyn EmployeeRanker,
    validator: ConstraintValidator<'s>,
    pairing: PairingResolver<'s>,
    rotation: RotationManager,
    orderer: PriorityOrderer,
    resolver: ConflictResolver<'s>,
}

impl<'s> Pass<'s> {
    /// Whether `event` falls inside the run's lead-time and horizon window.
    fn in_window(&self, event: &WorkEvent) -> bool {
        let today = self.snapshot.today;
        event.due_date >= self.orderer.earliest_due(today)
            && event.start_date <= self.orderer.horizon_end(today)
    }

    fn fail_orphans(&self, pending: &[&WorkEvent], state: &mut RunState) {
        for event in pending {
            if event.locked
                || !self.pairing.index().is_orphan(&event.id)
                || !self.in_window(event)
            {
                continue;
            }
            let at = self.start_time(event, event.due_date);
            warn!(
                event = %event.id,
                reason = FailureReason::OrphanCompanion.code(),
                "event not placed"
            );
            let txn = state.ledger.begin();
            state.ledger.record(
                txn,
                EntryKind::Failed,
                Assignment::failed(&event.id, at, FailureReason::OrphanCompanion, Vec::new()),
            );
        }
    }

    /// Places pending companions next to primaries committed by an earlier run.
    fn staff_committed_primaries(&self, pending: &[&WorkEvent], state: &mut RunState) {
        let pending: BTreeSet<&str> = pending.iter().map(|e| e.id.as_str()).collect();
        let primaries: Vec<Assignment> = state
            .roster
            .iter()
            .filter(|a| !self.pairing.index().companions_of(&a.event_id).is_empty())
            .cloned()
            .collect();

        for primary in primaries {
            for companion_id in self.pairing.index().companions_of(&primary.event_id) {
                if !pending.contains(companion_id.as_str()) || state.roster.contains(companion_id) {
                    continue;
                }
                let Some(companion) = self.validator.event(companion_id) else {
                    continue;
                };
                if companion.locked {
                    continue;
                }

                let lead = self.rotation.lead_of_day(primary.date());
                let placed = self.pairing.place_companion(
                    &self.validator,
                    &state.roster,
                    &BTreeSet::new(),
                    companion,
                    &primary,
                    lead.as_deref(),
                );
                let txn = state.ledger.begin();
                match placed {
                    Ok(assignment) => {
                        debug!(
                            event = %companion.id,
                            primary = %primary.event_id,
                            "companion placed beside committed primary"
                        );
                        state.roster.insert(assignment.clone());
                        state.ledger.record(txn, EntryKind::Proposed, assignment);
                    }
                    Err(violations) => {
                        warn!(
                            event = %companion.id,
                            reason = FailureReason::CompanionUnplaceable.code(),
                            "event not placed"
                        );
                        let at = self.pairing.companion_time(companion, primary.scheduled_at);
                        state.ledger.record(
                            txn,
                            EntryKind::Failed,
                            Assignment::failed(
                                &companion.id,
                                at,
                                FailureReason::CompanionUnplaceable,
                                violations,
                            ),
                        );
                    }
                }
            }
        }
    }

    fn run_wave(
        &self,
        wave: Wave,
        queues: &mut BTreeMap<Wave, VecDeque<EventId>>,
        state: &mut RunState,
    ) {
        debug!(?wave, pending = queues.get(&wave).map_or(0, VecDeque::len), "wave started");
        while let Some(id) = queues.get_mut(&wave).and_then(VecDeque::pop_front) {
            let Some(event) = self.validator.event(&id) else {
                continue;
            };
            if state.roster.contains(&id) {
                continue;
            }
            if let PlacementOutcome::Placed { displaced, .. } =
                self.place(event, self.config.max_bumps, state)
            {
                for victim in displaced {
                    let target = self
                        .validator
                        .event(&victim)
                        .map_or(wave, |v| v.wave().max(wave));
                    queues.entry(target).or_default().push_back(victim);
                }
            }
        }
    }

    /// Retries near-term failures with one extra bump attempt.
    fn rescue(&self, state: &mut RunState) {
        let until =
            self.snapshot.today + TimeDelta::days(i64::from(self.config.rescue_window_days));
        let mut failed: Vec<&WorkEvent> = self
            .snapshot
            .events
            .iter()
            .filter(|e| !e.event_type.is_companion() && e.due_date <= until)
            .filter(|e| !state.roster.contains(&e.id))
            .filter(|e| {
                state
                    .ledger
                    .latest(&e.id)
                    .is_some_and(|l| l.kind == EntryKind::Failed)
            })
            .collect();
        if failed.is_empty() {
            return;
        }
        failed.sort_by(|a, b| {
            UrgencyKey::of(a)
                .cmp(&UrgencyKey::of(b))
                .then(a.start_date.cmp(&b.start_date))
                .then_with(|| a.id.cmp(&b.id))
        });
        info!(events = failed.len(), "rescue pass started");

        let mut queue: VecDeque<(&WorkEvent, u32, bool)> = failed
            .into_iter()
            .map(|e| (e, self.config.max_bumps + 1, true))
            .collect();
        while let Some((event, allowance, rescuing)) = queue.pop_front() {
            if state.roster.contains(&event.id) {
                continue;
            }
            if let PlacementOutcome::Placed { displaced, .. } =
                self.place(event, allowance, state)
            {
                if rescuing {
                    state.rescued += 1;
                }
                for victim in displaced.iter().filter_map(|id| self.validator.event(id)) {
                    queue.push_back((victim, self.config.max_bumps, false));
                }
            }
        }
    }

    /// Searches for a placement of `event`, bumping if allowed.
    ///
    /// `allowance` bounds the event's own bump attempts over the whole run.
    fn place(&self, event: &WorkEvent, allowance: u32, state: &mut RunState) -> PlacementOutcome {
        let today = self.snapshot.today;
        let from = event.start_date.max(self.orderer.earliest_due(today));
        let to = event.due_date.min(self.orderer.horizon_end(today));
        if from > to {
            let at = self.start_time(event, event.due_date);
            let search = Search::default();
            return self.fail(event, FailureReason::DueDateUnreachable, at, search, state);
        }

        let rotation_governed = RotationManager::rotation_for(event.event_type).is_some();
        let qualified = self
            .snapshot
            .employees
            .iter()
            .any(|e| e.active && e.can_work(event.event_type));
        if !qualified && !rotation_governed {
            let at = self.start_time(event, from);
            let search = Search::default();
            return self.fail(event, FailureReason::NoQualifiedEmployee, at, search, state);
        }

        let mut search = Search::default();
        for date in dates_between(from, to) {
            let candidates = self.candidates(event, date, &state.roster);
            if candidates.is_empty() && rotation_governed {
                search.rotation_gap = true;
            }
            let at = self.start_time(event, date);
            for employee in candidates {
                search.tried += 1;
                search.last_at = Some(at);
                let outcome = self.validator.validate(event, employee, at, &state.roster);
                if !outcome.valid {
                    debug!(
                        event = %event.id,
                        employee = %employee.id,
                        %date,
                        violations = outcome.violations.len(),
                        "candidate rejected"
                    );
                    if outcome.is_bumpable_only() {
                        search.bumpable.push(BumpCandidate {
                            employee,
                            at,
                            outcome: outcome.clone(),
                        });
                    }
                    search.last_violations = outcome.violations;
                    continue;
                }

                let lead = self.rotation.lead_of_day(date);
                let primary = Assignment::proposed(&event.id, &employee.id, at);
                match self.pairing.plan(
                    &self.validator,
                    &state.roster,
                    &BTreeSet::new(),
                    event,
                    primary,
                    lead.as_deref(),
                ) {
                    PairPlan::Ready(placements) => {
                        return self.commit(event, placements, None, state);
                    }
                    PairPlan::CompanionBlocked { companion, violations } => {
                        debug!(
                            event = %event.id,
                            employee = %employee.id,
                            %companion,
                            "companion blocked"
                        );
                        search.last_violations = violations.clone();
                        search.blocked_companion = Some((companion, violations));
                    }
                }
            }
        }

        let attempts = state.bump_attempts.get(&event.id).copied().unwrap_or(0);
        let may_bump = attempts < allowance;
        if !search.bumpable.is_empty() && may_bump {
            *state.bump_attempts.entry(event.id.clone()).or_insert(0) += 1;
            if let Some(plan) = self.resolver.find(
                event,
                &search.bumpable,
                &self.validator,
                &self.pairing,
                &self.rotation,
                &state.roster,
                &state.bump_counts,
            ) {
                let placements = plan.placements.clone();
                return self.commit(event, placements, Some(plan), state);
            }
        }

        let reason = if state
            .bump_counts
            .get(&event.id)
            .is_some_and(|&n| n >= self.config.max_bumps)
        {
            FailureReason::BumpLimitExceeded
        } else if search.blocked_companion.is_some() {
            FailureReason::CompanionUnplaceable
        } else if !search.bumpable.is_empty() && !may_bump {
            FailureReason::BumpLimitExceeded
        } else if !search.bumpable.is_empty() {
            FailureReason::ConflictsNotDisplaceable
        } else if search.rotation_gap && search.tried == 0 {
            FailureReason::RotationGap
        } else {
            FailureReason::AllCandidatesUnavailable
        };
        let at = search
            .last_at
            .unwrap_or_else(|| self.start_time(event, to));
        self.fail(event, reason, at, search, state)
    }

    /// Candidate employees for `event` on `date`, best first.
    ///
    /// Rotation work tries the resolved rotation employees before the ranked
    /// pool and never falls back to an employee an exception removed. Lead
    /// support tries the lead of the day first.
    fn candidates(&self, event: &WorkEvent, date: NaiveDate, roster: &Roster) -> Vec<&'s Employee> {
        let pool = self
            .snapshot
            .employees
            .iter()
            .filter(|e| e.active && e.can_work(event.event_type));
        let mut ranked =
            rank_candidates(self.ranker, event, pool, |e| self.weekly_load(e, date, roster));

        let mut first: Vec<&'s Employee> = Vec::new();
        if let Some(rotation_type) = RotationManager::rotation_for(event.event_type) {
            let removed = self.rotation.removed(date, rotation_type);
            first = self
                .rotation
                .candidates(date, rotation_type)
                .iter()
                .filter_map(|id| self.snapshot.employee(id))
                .collect();
            ranked.retain(|e| !removed.contains(&e.id));
        } else if event.event_type.is_lead_support() {
            first = self
                .rotation
                .lead_of_day(date)
                .and_then(|id| self.snapshot.employee(&id))
                .into_iter()
                .collect();
        }

        ranked.retain(|e| !first.iter().any(|f| f.id == e.id));
        first.extend(ranked);
        first
    }

    /// Production events held by `employee` in the week of `date`.
    fn weekly_load(&self, employee: &Employee, date: NaiveDate, roster: &Roster) -> usize {
        roster
            .in_week(&employee.id, date)
            .filter(|a| {
                self.validator
                    .event(&a.event_id)
                    .is_some_and(|e| e.event_type.is_quota_counted())
            })
            .count()
    }

    /// Start time of `event` on `date` before any block is finalized.
    fn start_time(&self, event: &WorkEvent, date: NaiveDate) -> NaiveDateTime {
        let time = if event.event_type.is_block_governed() {
            self.snapshot
                .shift_blocks
                .first_arrival()
                .unwrap_or(self.config.times.generic)
        } else {
            self.config.times.for_type(event.event_type)
        };
        date.and_time(time)
    }

    /// Records placements (and the displacement that made room) as one
    /// ledger transaction.
    fn commit(
        &self,
        event: &WorkEvent,
        placements: Vec<Assignment>,
        bump: Option<BumpPlan>,
        state: &mut RunState,
    ) -> PlacementOutcome {
        let txn = state.ledger.begin();
        let mut displaced = Vec::new();

        if let Some(plan) = bump {
            for id in &plan.displaced {
                if let Some(removed) = state.roster.remove(id) {
                    state.ledger.record(txn, EntryKind::Bumped, removed.bumped(&event.id));
                }
            }
            let count = state.bump_counts.entry(plan.victim.clone()).or_insert(0);
            *count += 1;
            info!(
                event = %event.id,
                victim = %plan.victim,
                bump_count = *count,
                "assignment bumped"
            );
            displaced.push(plan.victim);
        }

        for a in &placements {
            debug!(
                event = %a.event_id,
                employee = a.employee_id.as_deref().unwrap_or_default(),
                at = %a.scheduled_at,
                "assignment proposed"
            );
            state.roster.insert(a.clone());
            state.ledger.record(txn, EntryKind::Proposed, a.clone());
        }

        PlacementOutcome::Placed {
            assignments: placements,
            displaced,
        }
    }

    /// Records a failure for `event` and its companions.
    fn fail(
        &self,
        event: &WorkEvent,
        reason: FailureReason,
        at: NaiveDateTime,
        search: Search<'_>,
        state: &mut RunState,
    ) -> PlacementOutcome {
        warn!(event = %event.id, reason = reason.code(), "event not placed");
        let txn = state.ledger.begin();
        let record = Assignment::failed(&event.id, at, reason, search.last_violations);
        state.ledger.record(txn, EntryKind::Failed, record.clone());

        for companion in self.pairing.index().companions_of(&event.id) {
            if state.roster.contains(companion) {
                continue;
            }
            let violations = match &search.blocked_companion {
                Some((blocked, v)) if blocked == companion => v.clone(),
                _ => Vec::new(),
            };
            state.ledger.record(
                txn,
                EntryKind::Failed,
                Assignment::failed(companion, at, reason, violations),
            );
        }
        PlacementOutcome::Failed(record)
    }

    /// Allocates shift blocks per day for proposed block-governed work.
    fn finalize_blocks(&self, state: &mut RunState) {
        let allocator = ShiftBlockAllocator::new(&self.snapshot.shift_blocks);
        let mut by_day: BTreeMap<NaiveDate, Vec<(usize, BlockRequest)>> = BTreeMap::new();
        let mut committed: BTreeMap<NaiveDate, Vec<BlockHolder>> = BTreeMap::new();

        for a in state.roster.iter() {
            let governed = self
                .validator
                .event(&a.event_id)
                .is_some_and(|e| e.event_type.is_block_governed());
            let Some(employee_id) = a.employee_id.clone() else {
                continue;
            };
            if !governed {
                continue;
            }
            if a.status == AssignmentStatus::Committed {
                if let Some(block) = a.shift_block {
                    committed
                        .entry(a.date())
                        .or_default()
                        .push(BlockHolder { employee_id, block });
                }
                continue;
            }
            if a.status != AssignmentStatus::Proposed || a.shift_block.is_some() {
                continue;
            }
            let seq = state.ledger.proposed_at(&a.event_id).unwrap_or(usize::MAX);
            by_day.entry(a.date()).or_default().push((
                seq,
                BlockRequest {
                    event_id: a.event_id.clone(),
                    employee_id,
                },
            ));
        }

        for (date, mut requests) in by_day {
            requests.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.event_id.cmp(&b.1.event_id)));
            let requests: Vec<BlockRequest> = requests.into_iter().map(|(_, r)| r).collect();
            let lead = self.rotation.lead_of_day(date);
            let held = committed.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let slots = allocator.allocate(&requests, held, lead.as_deref());

            let txn = state.ledger.begin();
            for slot in slots {
                let Some(a) = state.roster.get_mut(&slot.event_id) else {
                    continue;
                };
                a.shift_block = Some(slot.block);
                a.scheduled_at = date.and_time(slot.arrival);
                let finalized = a.clone();
                state.ledger.record(txn, EntryKind::BlockAssigned, finalized);
            }
        }
    }

    /// Final assignments: proposals, failures, and bump records of committed
    /// work, by event ID.
    fn collect(&self, state: &RunState) -> Vec<Assignment> {
        let mut out: Vec<Assignment> = state
            .roster
            .iter()
            .filter(|a| a.status == AssignmentStatus::Proposed)
            .cloned()
            .collect();

        for event in &self.snapshot.events {
            if state.roster.contains(&event.id) {
                continue;
            }
            if let Some(entry) = state.ledger.latest(&event.id) {
                if entry.kind == EntryKind::Failed {
                    out.push(entry.assignment.clone());
                }
            }
        }

        out.extend(
            state
                .ledger
                .bumped_committed()
                .into_iter()
                .map(|e| e.assignment.clone()),
        );
        out.sort_by(|a, b| a.event_id.cmp(&b.event_id).then(a.status.cmp(&b.status)));
        out
    }
}
