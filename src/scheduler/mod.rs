//! Scheduling engine and run state.
//!
//! Orchestrates the ordering, validation, rotation, pairing, bumping and
//! shift-block components over one immutable [`ScheduleSnapshot`].
//!
//! # Run Phases
//!
//! | Phase | Effect |
//! |-------|--------|
//! | Wave(k) | Place pending events of wave k, bumping when allowed |
//! | Rescue | Retry near-term failures with one extra bump attempt |
//! | Finalize | Allocate shift blocks per day |
//!
//! Results are proposals only: the caller reviews the [`RunLedger`] and
//! commits what it accepts.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"

mod engine;
mod ledger;
mod roster;
mod snapshot;
mod stats;

#[cfg(test)]
mod scenarios;

pub use engine::{PlacementOutcome, SchedulingEngine, SchedulingRun};
pub use ledger::{EntryKind, LedgerEntry, RunLedger, TxnId};
pub use roster::Roster;
pub use snapshot::ScheduleSnapshot;
pub use stats::RunStats;
