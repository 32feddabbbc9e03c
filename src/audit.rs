//! Post-run audit.
//!
//! Re-checks a finished run against the scheduling invariants, independently
//! of the engine's incremental bookkeeping. Callers can gate approval on it;
//! the test suite runs it over randomized snapshots.
//!
//! # Invariants
//!
//! - **Outcome**: one final proposal or failure per event.
//! - **Placement**: inside the event window, never on a holiday or locked
//!   date; the employee is active, available and eligible, and was not
//!   removed from the rotation that day.
//! - **Overlap**: no overlapping same-day work per employee, except a
//!   companion with its own primary.
//! - **Quota**: daily limit (Supervisors exempt) and weekly limit on
//!   Production.
//! - **Pairing**: placed primaries have all companions on the same day, and
//!   vice versa.
//! - **Blocks**: block-governed proposals carry a block and start at its
//!   arrival. Each employee holds one block per day, committed work
//!   included. The lead of the day sits in block 1 unless committed
//!   elsewhere. No block is shared while another is free.
//! - **Bumps**: no event displaced more than `max_bumps` times.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::config::SchedulerConfig;
use crate::models::{week_start, Assignment, AssignmentStatus, Interval, Role, WorkEvent};
use crate::pairing::PairingIndex;
use crate::rotation::RotationManager;
use crate::scheduler::{EntryKind, ScheduleSnapshot, SchedulingRun};

/// Audit result.
pub type AuditResult = Result<(), Vec<AuditFinding>>;

/// An invariant violated by a run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditFinding {
    /// Finding category.
    pub kind: AuditFindingKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of audit findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditFindingKind {
    /// An event has several final outcomes.
    DuplicateOutcome,
    /// A proposal breaks a placement rule.
    InvalidPlacement,
    /// Two assignments of one employee overlap.
    Overlap,
    /// Daily production limit exceeded.
    DailyQuota,
    /// Weekly production limit exceeded.
    WeeklyQuota,
    /// A placed primary lacks a companion on its day.
    MissingCompanion,
    /// A placed companion lacks its primary on its day.
    OrphanedCompanion,
    /// Block numbers or arrival times are inconsistent.
    BlockConflict,
    /// An event was displaced more often than allowed.
    BumpLimit,
}

impl AuditFinding {
    /// Creates a finding.
    pub fn new(kind: AuditFindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Audits `run`, produced from `snapshot` under `config`.
///
/// # Returns
/// `Ok(())` if every invariant holds, `Err(findings)` with all violations.
pub fn audit_run(
    snapshot: &ScheduleSnapshot<'_>,
    config: &SchedulerConfig,
    run: &SchedulingRun,
) -> AuditResult {
    let audit = Audit::new(snapshot, config, run);
    let mut findings = Vec::new();
    audit.check_outcomes(&mut findings);
    audit.check_placements(&mut findings);
    audit.check_overlaps(&mut findings);
    audit.check_quotas(&mut findings);
    audit.check_pairing(&mut findings);
    audit.check_blocks(&mut findings);
    audit.check_bumps(&mut findings);

    if findings.is_empty() {
        Ok(())
    } else {
        Err(findings)
    }
}

struct Audit<'a> {
    snapshot: &'a ScheduleSnapshot<'a>,
    config: &'a SchedulerConfig,
    run: &'a SchedulingRun,
    events: BTreeMap<&'a str, &'a WorkEvent>,
    pairing: PairingIndex,
    rotation: RotationManager,
    /// Work standing after the run: proposals plus undisplaced committed input.
    active: BTreeMap<&'a str, &'a Assignment>,
}

impl<'a> Audit<'a> {
    fn new(
        snapshot: &'a ScheduleSnapshot<'a>,
        config: &'a SchedulerConfig,
        run: &'a SchedulingRun,
    ) -> Self {
        let bumped: BTreeSet<&str> = run
            .assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Bumped)
            .map(|a| a.event_id.as_str())
            .collect();
        let mut active: BTreeMap<&str, &Assignment> = snapshot
            .committed
            .iter()
            .filter(|a| a.is_active() && !bumped.contains(a.event_id.as_str()))
            .map(|a| (a.event_id.as_str(), a))
            .collect();
        active.extend(run.proposals().map(|a| (a.event_id.as_str(), a)));

        Self {
            snapshot,
            config,
            run,
            events: snapshot.events.iter().map(|e| (e.id.as_str(), e)).collect(),
            pairing: PairingIndex::build(&snapshot.events, config),
            rotation: RotationManager::new(&snapshot.rotations, &snapshot.exceptions),
            active,
        }
    }

    fn duration(&self, a: &Assignment) -> u32 {
        self.events
            .get(a.event_id.as_str())
            .map_or(0, |e| e.duration_minutes)
    }

    fn is_production(&self, a: &Assignment) -> bool {
        self.events
            .get(a.event_id.as_str())
            .is_some_and(|e| e.event_type.is_quota_counted())
    }

    /// Active assignments grouped by (employee, date).
    fn by_employee_day(&self) -> BTreeMap<(&'a str, NaiveDate), Vec<&'a Assignment>> {
        let mut groups: BTreeMap<(&str, NaiveDate), Vec<&Assignment>> = BTreeMap::new();
        for &a in self.active.values() {
            if let Some(employee) = a.employee_id.as_deref() {
                groups.entry((employee, a.date())).or_default().push(a);
            }
        }
        groups
    }

    fn check_outcomes(&self, findings: &mut Vec<AuditFinding>) {
        let mut outcomes: BTreeMap<&str, usize> = BTreeMap::new();
        for a in &self.run.assignments {
            if matches!(a.status, AssignmentStatus::Proposed | AssignmentStatus::Failed) {
                *outcomes.entry(a.event_id.as_str()).or_insert(0) += 1;
            }
        }
        for (event_id, count) in outcomes.into_iter().filter(|(_, n)| *n > 1) {
            findings.push(AuditFinding::new(
                AuditFindingKind::DuplicateOutcome,
                format!("Event '{event_id}' has {count} final outcomes"),
            ));
        }
    }

    fn check_placements(&self, findings: &mut Vec<AuditFinding>) {
        for a in self.run.proposals() {
            let date = a.date();
            let mut problems = Vec::new();
            let Some(event) = self.events.get(a.event_id.as_str()) else {
                problems.push("unknown event".to_string());
                findings.push(invalid(a, &problems));
                continue;
            };
            if !event.window_contains(date) {
                problems.push(format!("outside window {}..={}", event.start_date, event.due_date));
            }
            if self.snapshot.holidays.contains(&date) {
                problems.push("on a holiday".to_string());
            }
            if self.snapshot.locked_dates.contains(&date) {
                problems.push("on a locked date".to_string());
            }
            match a.employee_id.as_deref().and_then(|id| self.snapshot.employee(id)) {
                None => problems.push("no known employee".to_string()),
                Some(e) => {
                    if !e.active {
                        problems.push(format!("employee '{}' inactive", e.id));
                    }
                    if !self.snapshot.availability.is_available(&e.id, date) {
                        problems.push(format!("employee '{}' unavailable", e.id));
                    }
                    if !e.can_work(event.event_type) {
                        problems.push(format!("employee '{}' ineligible", e.id));
                    }
                    if let Some(rotation_type) = RotationManager::rotation_for(event.event_type) {
                        if self.rotation.removed(date, rotation_type).contains(&e.id) {
                            problems.push(format!("employee '{}' removed from rotation", e.id));
                        }
                    }
                }
            }
            if !problems.is_empty() {
                findings.push(invalid(a, &problems));
            }
        }
    }

    fn check_overlaps(&self, findings: &mut Vec<AuditFinding>) {
        for ((employee, date), day) in self.by_employee_day() {
            for (i, a) in day.iter().enumerate() {
                let span_a = Interval::from_minutes(a.scheduled_at, self.duration(a));
                for b in &day[i + 1..] {
                    let span_b = Interval::from_minutes(b.scheduled_at, self.duration(b));
                    if span_a.overlaps(&span_b) && !self.pairing.is_pair(&a.event_id, &b.event_id) {
                        findings.push(AuditFinding::new(
                            AuditFindingKind::Overlap,
                            format!(
                                "'{}' and '{}' overlap for employee '{employee}' on {date}",
                                a.event_id, b.event_id
                            ),
                        ));
                    }
                }
            }
        }
    }

    fn check_quotas(&self, findings: &mut Vec<AuditFinding>) {
        let mut weekly: BTreeMap<(&str, NaiveDate), usize> = BTreeMap::new();
        for ((employee, date), day) in self.by_employee_day() {
            let count = day.iter().filter(|a| self.is_production(a)).count();
            *weekly.entry((employee, week_start(date))).or_insert(0) += count;

            let exempt = self
                .snapshot
                .employee(employee)
                .is_some_and(|e| e.role == Role::Supervisor);
            if !exempt && count > self.config.daily_production_limit as usize {
                findings.push(AuditFinding::new(
                    AuditFindingKind::DailyQuota,
                    format!("Employee '{employee}' has {count} production events on {date}"),
                ));
            }
        }
        for ((employee, week), count) in weekly {
            if count > self.config.weekly_production_limit as usize {
                findings.push(AuditFinding::new(
                    AuditFindingKind::WeeklyQuota,
                    format!("Employee '{employee}' has {count} production events in week {week}"),
                ));
            }
        }
    }

    fn check_pairing(&self, findings: &mut Vec<AuditFinding>) {
        let on_same_day =
            |id: &str, date: NaiveDate| self.active.get(id).is_some_and(|a| a.date() == date);

        for a in self.run.proposals() {
            for companion in self.pairing.companions_of(&a.event_id) {
                if !on_same_day(companion.as_str(), a.date()) {
                    findings.push(AuditFinding::new(
                        AuditFindingKind::MissingCompanion,
                        format!("'{}' is placed without companion '{companion}'", a.event_id),
                    ));
                }
            }
            let is_companion = self
                .events
                .get(a.event_id.as_str())
                .is_some_and(|e| e.event_type.is_companion());
            if is_companion {
                let paired = self
                    .pairing
                    .primary_of(&a.event_id)
                    .is_some_and(|p| on_same_day(p.as_str(), a.date()));
                if !paired {
                    findings.push(AuditFinding::new(
                        AuditFindingKind::OrphanedCompanion,
                        format!("Companion '{}' is placed without its primary", a.event_id),
                    ));
                }
            }
        }
    }

    fn check_blocks(&self, findings: &mut Vec<AuditFinding>) {
        #[derive(Default)]
        struct Held {
            blocks: BTreeSet<u8>,
            committed: bool,
        }
        let mut by_employee: BTreeMap<(&str, NaiveDate), Held> = BTreeMap::new();
        let mut by_block: BTreeMap<(NaiveDate, u8), (BTreeSet<&str>, bool)> = BTreeMap::new();

        for &a in self.active.values() {
            let governed = self
                .events
                .get(a.event_id.as_str())
                .is_some_and(|e| e.event_type.is_block_governed());
            if !governed {
                continue;
            }
            let proposed = a.status == AssignmentStatus::Proposed;
            let Some(block) = a.shift_block else {
                if proposed {
                    findings.push(AuditFinding::new(
                        AuditFindingKind::BlockConflict,
                        format!("'{}' has no shift block", a.event_id),
                    ));
                }
                continue;
            };
            if proposed
                && self.snapshot.shift_blocks.arrival(block) != Some(a.scheduled_at.time())
            {
                findings.push(AuditFinding::new(
                    AuditFindingKind::BlockConflict,
                    format!("'{}' does not start at the arrival of block {block}", a.event_id),
                ));
            }
            let Some(employee) = a.employee_id.as_deref() else {
                continue;
            };
            let held = by_employee.entry((employee, a.date())).or_default();
            held.blocks.insert(block);
            held.committed |= !proposed;
            let holders = by_block.entry((a.date(), block)).or_default();
            holders.0.insert(employee);
            holders.1 |= proposed;
        }

        for ((employee, date), held) in &by_employee {
            if held.blocks.len() > 1 {
                findings.push(AuditFinding::new(
                    AuditFindingKind::BlockConflict,
                    format!("Employee '{employee}' holds blocks {:?} on {date}", held.blocks),
                ));
            }
            let is_lead = self.rotation.lead_of_day(*date).as_deref() == Some(*employee);
            if is_lead && !held.committed && !held.blocks.contains(&1) {
                findings.push(AuditFinding::new(
                    AuditFindingKind::BlockConflict,
                    format!("Lead of the day '{employee}' is not in block 1 on {date}"),
                ));
            }
        }

        // A new block may only be shared once every block of the day is held.
        for (&(date, block), (holders, any_proposed)) in &by_block {
            if holders.len() < 2 || !any_proposed {
                continue;
            }
            let lead = self.rotation.lead_of_day(date);
            if block == 1 && lead.as_deref().is_some_and(|l| holders.contains(l)) {
                continue;
            }
            let free = self
                .snapshot
                .shift_blocks
                .blocks
                .iter()
                .any(|b| !by_block.contains_key(&(date, b.number)));
            if free {
                findings.push(AuditFinding::new(
                    AuditFindingKind::BlockConflict,
                    format!("Block {block} shared by {holders:?} on {date} while blocks are free"),
                ));
            }
        }
    }

    fn check_bumps(&self, findings: &mut Vec<AuditFinding>) {
        let mut bumps: BTreeMap<&str, u32> = BTreeMap::new();
        for e in self.run.ledger.entries() {
            if e.kind == EntryKind::Bumped {
                *bumps.entry(e.assignment.event_id.as_str()).or_insert(0) += 1;
            }
        }
        for (event_id, count) in bumps {
            if count > self.config.max_bumps {
                findings.push(AuditFinding::new(
                    AuditFindingKind::BumpLimit,
                    format!("'{event_id}' was displaced {count} times"),
                ));
            }
        }
    }
}

fn invalid(a: &Assignment, problems: &[String]) -> AuditFinding {
    AuditFinding::new(
        AuditFindingKind::InvalidPlacement,
        format!("'{}' on {}: {}", a.event_id, a.date(), problems.join(", ")),
    )
}
