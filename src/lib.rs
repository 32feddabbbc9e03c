//! Workforce event auto-scheduling for the U-Engine ecosystem.
//!
//! Assigns employees to time-bound work events (in-store demonstrations and
//! their support tasks) under eligibility, availability, pairing and fairness
//! rules, and resolves conflicts by displacing less urgent work. Runs are
//! deterministic over an immutable snapshot and produce proposals only;
//! committing them is the caller's decision.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WorkEvent`, `Employee`, `Assignment`,
//!   `RotationAssignment`, `ShiftBlockConfig`, `Violation`
//! - **`config`**: `SchedulerConfig` thresholds and default times
//! - **`availability`**: `AvailabilityResolver` seam and a priority-chain table
//! - **`validation`**: Input integrity checks (duplicate IDs, date ranges,
//!   shift blocks, references)
//! - **`ordering`**: Dispatching rules and wave planning
//! - **`validator`**: Per-candidate constraint checks (hard vs bumpable)
//! - **`rotation`**: Weekly rotation resolution with date exceptions
//! - **`ranking`**: Pluggable candidate ranking
//! - **`shift_blocks`**: Staggered arrival block allocation
//! - **`pairing`**: Primary/companion linking and joint placement
//! - **`bumper`**: Displacement of less urgent assignments
//! - **`scheduler`**: The engine, run ledger and statistics
//! - **`audit`**: Post-run invariant checks
//!
//! # Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use u_roster::config::SchedulerConfig;
//! use u_roster::models::{AssignmentStatus, Employee, EventType, Role, WorkEvent};
//! use u_roster::scheduler::{ScheduleSnapshot, SchedulingEngine};
//!
//! let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
//! let day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
//! let snapshot = ScheduleSnapshot::new(today)
//!     .with_events(vec![
//!         WorkEvent::new("DEMO-1", EventType::Production, day),
//!         WorkEvent::new("SUP-1", EventType::Supervision, day).paired_with("DEMO-1"),
//!     ])
//!     .with_employees(vec![
//!         Employee::new("ana", Role::Specialist),
//!         Employee::new("ben", Role::Supervisor),
//!     ]);
//!
//! let run = SchedulingEngine::new(SchedulerConfig::default()).run(&snapshot)?;
//! assert_eq!(run.stats.scheduled, 2);
//! assert!(run.assignments.iter().all(|a| a.status == AssignmentStatus::Proposed));
//! # Ok::<(), u_roster::error::SchedulerError>(())
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"

pub mod audit;
pub mod availability;
pub mod bumper;
pub mod config;
pub mod error;
pub mod models;
pub mod ordering;
pub mod pairing;
pub mod ranking;
pub mod rotation;
pub mod scheduler;
pub mod shift_blocks;
pub mod validation;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;
