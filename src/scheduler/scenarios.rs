//! End-to-end engine scenarios.

use std::sync::atomic::AtomicBool;

use chrono::{NaiveTime, Weekday};

use super::*;
use crate::audit::audit_run;
use crate::availability::AvailabilityTable;
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::models::{
    Assignment, AssignmentStatus, Employee, EventType, FailureReason, Role, RotationAssignment,
    RotationException, RotationType, ViolationKind, WorkEvent,
};
use crate::testing::{at, day, production, specialists, RandomCase};

fn run(snapshot: &ScheduleSnapshot<'_>) -> SchedulingRun {
    SchedulingEngine::new(SchedulerConfig::default())
        .run(snapshot)
        .unwrap()
}

fn reason(run: &SchedulingRun, event_id: &str) -> Option<FailureReason> {
    run.find(event_id, AssignmentStatus::Failed)
        .and_then(|a| a.failure)
}

fn employee_of<'r>(run: &'r SchedulingRun, event_id: &str) -> Option<&'r str> {
    run.find(event_id, AssignmentStatus::Proposed)
        .and_then(|a| a.employee_id.as_deref())
}

#[test]
fn test_urgent_event_bumps_committed() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("A", 3, 3), production("B", 2, 11)])
        .with_employees(specialists(1))
        .with_committed(vec![Assignment::committed("B", "S01", at(3, 9, 45)).with_block(1)]);

    let run = run(&snapshot);

    let a = run.find("A", AssignmentStatus::Proposed).unwrap();
    assert_eq!(a.date(), day(3));
    assert_eq!(a.shift_block, Some(1));

    let bumped = run.find("B", AssignmentStatus::Bumped).unwrap();
    assert_eq!(bumped.bumped_by.as_deref(), Some("A"));

    // B re-enters the queue and lands on the free day before.
    let b = run.find("B", AssignmentStatus::Proposed).unwrap();
    assert_eq!(b.date(), day(2));
    assert_eq!(run.stats.bumped, 1);

    // The bump and the placement it made room for share a transaction.
    let bump = run
        .ledger
        .entries()
        .iter()
        .find(|e| e.kind == EntryKind::Bumped)
        .unwrap();
    let kinds: Vec<_> = run
        .ledger
        .transaction(bump.txn)
        .map(|e| (e.kind, e.assignment.event_id.as_str()))
        .collect();
    assert_eq!(kinds, vec![(EntryKind::Bumped, "B"), (EntryKind::Proposed, "A")]);
}

#[test]
fn test_bump_limit_exceeded() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("A", 3, 3), production("B", 2, 11)])
        .with_employees(specialists(1))
        .with_committed(vec![Assignment::committed("B", "S01", at(3, 9, 45)).with_block(1)]);
    let config = SchedulerConfig::default()
        .with_max_bumps(0)
        .with_rescue_window_days(0);

    let run = SchedulingEngine::new(config).run(&snapshot).unwrap();

    assert_eq!(reason(&run, "A"), Some(FailureReason::BumpLimitExceeded));
    assert!(run.find("B", AssignmentStatus::Bumped).is_none());
    assert_eq!(run.assignments.len(), 1);
}

#[test]
fn test_quota_conflicts_not_displaceable() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            production("P1", 2, 4),
            production("P2", 2, 5),
            production("P3", 2, 6),
        ])
        .with_employees(specialists(1));
    let config = SchedulerConfig::default().with_weekly_production_limit(2);

    let run = SchedulingEngine::new(config).run(&snapshot).unwrap();

    assert_eq!(run.find("P1", AssignmentStatus::Proposed).unwrap().date(), day(2));
    assert_eq!(run.find("P2", AssignmentStatus::Proposed).unwrap().date(), day(3));
    // Weekly limit reached; the only holders are more urgent.
    assert_eq!(reason(&run, "P3"), Some(FailureReason::ConflictsNotDisplaceable));
    let failure = run.find("P3", AssignmentStatus::Failed).unwrap();
    assert!(failure
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::WeeklyQuota));
    assert_eq!(run.stats.bumped, 0);
}

#[test]
fn test_rescue_grants_one_more_bump() {
    // One specialist, one Production per day. B bumps V, A bumps W, then the
    // re-queued V bumps A. A has spent its only attempt and fails; the rescue
    // pass lets it displace X.
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            production("B", 2, 2),
            production("V", 2, 3),
            production("A", 3, 4),
            production("W", 3, 7),
            production("X", 4, 7),
        ])
        .with_employees(specialists(1))
        .with_committed(vec![
            Assignment::committed("V", "S01", at(2, 9, 45)).with_block(1),
            Assignment::committed("W", "S01", at(3, 9, 45)).with_block(1),
            Assignment::committed("X", "S01", at(4, 9, 45)).with_block(1),
        ]);
    let config = SchedulerConfig::default()
        .with_max_bumps(1)
        .with_protected_window_days(0)
        .with_rescue_window_days(3);

    let run = SchedulingEngine::new(config).run(&snapshot).unwrap();

    let dates: Vec<_> = ["B", "V", "A", "W", "X"]
        .iter()
        .map(|id| run.find(id, AssignmentStatus::Proposed).unwrap().date())
        .collect();
    assert_eq!(dates, vec![day(2), day(3), day(4), day(5), day(6)]);
    assert_eq!(run.stats.rescued, 1);
    assert_eq!(run.stats.bumped, 4);

    let history: Vec<_> = run.ledger.history("A").map(|e| e.kind).collect();
    assert_eq!(
        history,
        vec![
            EntryKind::Proposed,
            EntryKind::Bumped,
            EntryKind::Failed,
            EntryKind::Proposed,
            EntryKind::BlockAssigned,
        ]
    );
    let failed = run.ledger.history("A").find(|e| e.kind == EntryKind::Failed).unwrap();
    assert_eq!(failed.assignment.failure, Some(FailureReason::BumpLimitExceeded));

    // Only input-committed work is reported as bumped.
    let bumped: Vec<_> = run
        .assignments
        .iter()
        .filter(|a| a.status == AssignmentStatus::Bumped)
        .map(|a| a.event_id.as_str())
        .collect();
    assert_eq!(bumped, vec!["V", "W", "X"]);
}

#[test]
fn test_removed_rotation_primary_never_assigned() {
    // 2026-03-03 is a Tuesday.
    let employees = vec![
        Employee::new("R1", Role::RotationSpecialist),
        Employee::new("R2", Role::RotationSpecialist),
        Employee::new("R3", Role::RotationSpecialist),
    ];
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            WorkEvent::new("RP1", EventType::RotationProduction, day(3)),
            WorkEvent::new("RP2", EventType::RotationProduction, day(10)),
        ])
        .with_employees(employees)
        .with_rotations(vec![
            RotationAssignment::new(Weekday::Tue, RotationType::Specialty, "R1").with_backup("R2"),
        ])
        .with_exceptions(vec![RotationException::remove(day(3), RotationType::Specialty, "R1")]);

    let run = run(&snapshot);

    assert_eq!(employee_of(&run, "RP1"), Some("R2"));
    assert_eq!(employee_of(&run, "RP2"), Some("R1"));
    let rp1 = run.find("RP1", AssignmentStatus::Proposed).unwrap();
    assert_eq!(rp1.scheduled_at, at(3, 9, 0));
    assert_eq!(rp1.shift_block, None);
}

#[test]
fn test_rotation_gap() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![WorkEvent::new("RP", EventType::RotationProduction, day(3))])
        .with_employees(vec![Employee::new("R1", Role::RotationSpecialist)])
        .with_rotations(vec![RotationAssignment::new(Weekday::Tue, RotationType::Specialty, "R1")])
        .with_exceptions(vec![RotationException::remove(day(3), RotationType::Specialty, "R1")]);

    let run = run(&snapshot);

    assert_eq!(reason(&run, "RP"), Some(FailureReason::RotationGap));
}

#[test]
fn test_nine_block_events_with_lead() {
    // 2026-03-04 is a Wednesday.
    let mut employees = specialists(8);
    employees.push(Employee::new("L1", Role::Lead));
    let events = (1..=9)
        .map(|i| WorkEvent::new(format!("EV{i}"), EventType::Production, day(4)))
        .collect();
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(events)
        .with_employees(employees)
        .with_rotations(vec![RotationAssignment::new(Weekday::Wed, RotationType::Lead, "L1")]);

    let run = run(&snapshot);

    assert_eq!(run.stats.scheduled, 9);
    assert_eq!(employee_of(&run, "EV9"), Some("L1"));
    let blocks: Vec<Option<u8>> = (1..=9)
        .map(|i| run.find(&format!("EV{i}"), AssignmentStatus::Proposed).unwrap().shift_block)
        .collect();
    // Lead in block 1, the rest ascending, the overflow back in block 2.
    assert_eq!(
        blocks,
        vec![Some(2), Some(3), Some(4), Some(5), Some(6), Some(7), Some(8), Some(2), Some(1)]
    );
    let lead = run.find("EV9", AssignmentStatus::Proposed).unwrap();
    assert_eq!(lead.scheduled_at.time(), NaiveTime::from_hms_opt(9, 45, 0).unwrap());
    assert_eq!(run.ledger.count(EntryKind::BlockAssigned), 9);
}

#[test]
fn test_committed_blocks_stay_taken() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("A", 4, 4), production("B", 4, 4), production("C", 4, 4)])
        .with_employees(specialists(3))
        .with_committed(vec![Assignment::committed("B", "S01", at(4, 9, 45)).with_block(1)]);
    let config = SchedulerConfig::default();

    let run = SchedulingEngine::new(config.clone()).run(&snapshot).unwrap();

    let a = run.find("A", AssignmentStatus::Proposed).unwrap();
    let c = run.find("C", AssignmentStatus::Proposed).unwrap();
    assert_eq!((a.employee_id.as_deref(), a.shift_block), (Some("S02"), Some(2)));
    assert_eq!((c.employee_id.as_deref(), c.shift_block), (Some("S03"), Some(3)));
    assert_eq!(a.scheduled_at, at(4, 10, 0));
    assert!(audit_run(&snapshot, &config, &run).is_ok());
}

#[test]
fn test_lead_joins_committed_block_one() {
    // 2026-03-04 is a Wednesday. Committed work is never moved, so the lead
    // shares block 1 with it.
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("A", 4, 4), production("B", 4, 4), production("C", 4, 4)])
        .with_employees(vec![
            Employee::new("S01", Role::Specialist),
            Employee::new("S02", Role::Specialist),
            Employee::new("L1", Role::Lead),
        ])
        .with_rotations(vec![RotationAssignment::new(Weekday::Wed, RotationType::Lead, "L1")])
        .with_committed(vec![Assignment::committed("B", "S01", at(4, 9, 45)).with_block(1)]);
    let config = SchedulerConfig::default();

    let run = SchedulingEngine::new(config.clone()).run(&snapshot).unwrap();

    // Specialists rank first: A takes S02, C falls to the lead.
    let a = run.find("A", AssignmentStatus::Proposed).unwrap();
    let c = run.find("C", AssignmentStatus::Proposed).unwrap();
    assert_eq!((a.employee_id.as_deref(), a.shift_block), (Some("S02"), Some(2)));
    assert_eq!((c.employee_id.as_deref(), c.shift_block), (Some("L1"), Some(1)));
    assert!(audit_run(&snapshot, &config, &run).is_ok());
}

#[test]
fn test_supervision_companion_placed_together() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            production("P", 4, 4),
            WorkEvent::new("S", EventType::Supervision, day(4)).paired_with("P"),
        ])
        .with_employees(vec![
            Employee::new("S01", Role::Specialist),
            Employee::new("SUP", Role::Supervisor),
        ]);

    let run = run(&snapshot);

    assert_eq!(employee_of(&run, "P"), Some("S01"));
    assert_eq!(employee_of(&run, "S"), Some("SUP"));
    let s = run.find("S", AssignmentStatus::Proposed).unwrap();
    assert_eq!(s.scheduled_at, at(4, 12, 0));

    let txn_of = |id: &str| {
        run.ledger
            .history(id)
            .find(|e| e.kind == EntryKind::Proposed)
            .map(|e| e.txn)
    };
    assert_eq!(txn_of("P"), txn_of("S"));
}

#[test]
fn test_companion_unplaceable_fails_both() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            production("P", 4, 4),
            WorkEvent::new("S", EventType::Supervision, day(4)).paired_with("P"),
        ])
        .with_employees(specialists(2));

    let run = run(&snapshot);

    assert_eq!(reason(&run, "P"), Some(FailureReason::CompanionUnplaceable));
    assert_eq!(reason(&run, "S"), Some(FailureReason::CompanionUnplaceable));
    assert_eq!(run.stats.scheduled, 0);
    assert_eq!(run.stats.failed, 2);
}

#[test]
fn test_tight_survey_follows_primary() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            WorkEvent::new("RP", EventType::RotationProduction, day(4)),
            WorkEvent::new("RS", EventType::RotationSurvey, day(4)).paired_with("RP"),
        ])
        .with_employees(vec![
            Employee::new("R1", Role::RotationSpecialist),
            Employee::new("R2", Role::RotationSpecialist),
        ]);

    let run = run(&snapshot);

    let rp = run.find("RP", AssignmentStatus::Proposed).unwrap();
    let rs = run.find("RS", AssignmentStatus::Proposed).unwrap();
    assert_eq!(rp.employee_id, rs.employee_id);
    assert_eq!(rs.scheduled_at, at(4, 17, 0));
}

#[test]
fn test_survey_offset_past_midnight_fails_pair() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            WorkEvent::new("RP", EventType::RotationProduction, day(4)),
            WorkEvent::new("RS", EventType::RotationSurvey, day(4)).paired_with("RP"),
        ])
        .with_employees(vec![Employee::new("R1", Role::RotationSpecialist)]);
    // 09:00 + 16h lands on the next day.
    let config = SchedulerConfig::default().with_survey_offset_minutes(960);

    let run = SchedulingEngine::new(config).run(&snapshot).unwrap();

    assert_eq!(run.proposals().count(), 0);
    assert_eq!(reason(&run, "RP"), Some(FailureReason::CompanionUnplaceable));
    assert_eq!(reason(&run, "RS"), Some(FailureReason::CompanionUnplaceable));
    let failure = run.find("RP", AssignmentStatus::Failed).unwrap();
    assert!(failure
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::CompanionDayMismatch));
}

#[test]
fn test_orphan_companion() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![WorkEvent::new("S", EventType::Supervision, day(4))])
        .with_employees(vec![Employee::new("SUP", Role::Supervisor)]);

    let run = run(&snapshot);

    assert_eq!(reason(&run, "S"), Some(FailureReason::OrphanCompanion));
}

#[test]
fn test_companion_of_committed_primary() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            production("P", 4, 4),
            WorkEvent::new("S", EventType::Supervision, day(4)).paired_with("P"),
        ])
        .with_employees(vec![
            Employee::new("S01", Role::Specialist),
            Employee::new("L1", Role::Lead),
        ])
        .with_committed(vec![Assignment::committed("P", "S01", at(4, 10, 0)).with_block(2)]);

    let run = run(&snapshot);

    assert_eq!(employee_of(&run, "S"), Some("L1"));
    assert!(run.find("P", AssignmentStatus::Proposed).is_none());
}

#[test]
fn test_lead_support_prefers_lead_of_day() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![WorkEvent::new("SETUP", EventType::Setup, day(4))])
        .with_employees(vec![
            Employee::new("L1", Role::Lead),
            Employee::new("L2", Role::Lead),
        ])
        .with_rotations(vec![RotationAssignment::new(Weekday::Wed, RotationType::Lead, "L2")]);

    let run = run(&snapshot);

    assert_eq!(employee_of(&run, "SETUP"), Some("L2"));
    assert_eq!(
        run.find("SETUP", AssignmentStatus::Proposed).unwrap().scheduled_at,
        at(4, 8, 30)
    );
}

#[test]
fn test_custom_ranker() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("P", 4, 4)])
        .with_employees(vec![
            Employee::new("S01", Role::Specialist),
            Employee::new("SUP", Role::Supervisor),
        ]);
    let engine = SchedulingEngine::new(SchedulerConfig::default())
        .with_ranker(|_: &WorkEvent, e: &Employee| {
            if e.role == Role::Supervisor {
                1.0
            } else {
                0.0
            }
        });

    let run = engine.run(&snapshot).unwrap();

    assert_eq!(employee_of(&run, "P"), Some("SUP"));
}

#[test]
fn test_failure_reasons() {
    let availability = AvailabilityTable::new().with_time_off("S01", day(2), day(11));
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![
            production("P", 2, 4),
            WorkEvent::new("SETUP", EventType::Setup, day(4)),
        ])
        .with_employees(specialists(1))
        .with_availability(&availability);

    let run = run(&snapshot);

    assert_eq!(reason(&run, "P"), Some(FailureReason::AllCandidatesUnavailable));
    let p = run.find("P", AssignmentStatus::Failed).unwrap();
    assert_eq!(p.employee_id, None);
    assert!(p.violations.iter().any(|v| v.kind == ViolationKind::TimeOff));
    assert_eq!(reason(&run, "SETUP"), Some(FailureReason::NoQualifiedEmployee));
}

#[test]
fn test_due_date_unreachable() {
    // Lead time pushes the first date past the horizon.
    let config = SchedulerConfig::default()
        .with_min_lead_days(5)
        .with_horizon_days(3);
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("P", 3, 6)])
        .with_employees(specialists(1));

    let run = SchedulingEngine::new(config).run(&snapshot).unwrap();

    assert_eq!(reason(&run, "P"), Some(FailureReason::DueDateUnreachable));
}

#[test]
fn test_locked_event_left_alone() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("P", 4, 4).locked()])
        .with_employees(specialists(1));

    let run = run(&snapshot);

    assert!(run.assignments.is_empty());
    assert!(run.ledger.is_empty());
}

#[test]
fn test_cancelled_after_first_wave() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("P", 4, 4)])
        .with_employees(specialists(1));
    let cancel = AtomicBool::new(true);

    let result =
        SchedulingEngine::new(SchedulerConfig::default()).run_with_cancel(&snapshot, &cancel);

    assert!(matches!(
        result,
        Err(SchedulerError::Cancelled { completed_waves: 1 })
    ));
}

#[test]
fn test_invalid_input_rejected() {
    let snapshot = ScheduleSnapshot::new(day(1))
        .with_events(vec![production("P", 5, 4)])
        .with_employees(specialists(1));

    let result = SchedulingEngine::new(SchedulerConfig::default()).run(&snapshot);

    match result {
        Err(SchedulerError::InvalidInput(errors)) => assert!(!errors.is_empty()),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let engine = SchedulingEngine::new(SchedulerConfig::default());
    for seed in 0..8 {
        let case = RandomCase::generate(seed);
        let snapshot = case.snapshot();
        let first = serde_json::to_string(&engine.run(&snapshot).unwrap()).unwrap();
        let second = serde_json::to_string(&engine.run(&snapshot).unwrap()).unwrap();
        assert_eq!(first, second, "seed {seed}");
    }
}
