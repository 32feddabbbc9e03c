//! Run statistics.
//!
//! Summary counters computed from a finished run.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Scheduled | Events with a final proposal |
//! | Failed | Events whose final state is `Failed` |
//! | Bumped | Displacements performed |
//! | Rescued | Events placed by the rescue pass |
//! | Placement rate | scheduled / (scheduled + failed) |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ledger::{EntryKind, RunLedger};
use crate::models::{Assignment, AssignmentStatus, FailureReason, Wave, WorkEvent};

/// Summary counters of a scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Events proposed.
    pub scheduled: usize,
    /// Events that could not be placed.
    pub failed: usize,
    /// Displacements performed (each bump counted once).
    pub bumped: usize,
    /// Events placed by the rescue pass.
    pub rescued: usize,
    /// Failures by reason.
    pub failures_by_reason: BTreeMap<FailureReason, usize>,
    /// Proposals by wave (companions count toward their primary's wave).
    pub scheduled_by_wave: BTreeMap<Wave, usize>,
    /// Fraction of decided events that were placed (0.0..=1.0).
    pub placement_rate: f64,
}

impl RunStats {
    /// Computes statistics from the final assignments and the ledger.
    pub fn calculate<'e>(
        assignments: &[Assignment],
        ledger: &RunLedger,
        rescued: usize,
        event: impl Fn(&str) -> Option<&'e WorkEvent>,
    ) -> Self {
        let mut stats = Self {
            bumped: ledger.count(EntryKind::Bumped),
            rescued,
            ..Self::default()
        };

        for a in assignments {
            match a.status {
                AssignmentStatus::Proposed => {
                    stats.scheduled += 1;
                    if let Some(ev) = event(&a.event_id) {
                        *stats.scheduled_by_wave.entry(ev.wave()).or_insert(0) += 1;
                    }
                }
                AssignmentStatus::Failed => {
                    stats.failed += 1;
                    if let Some(reason) = a.failure {
                        *stats.failures_by_reason.entry(reason).or_insert(0) += 1;
                    }
                }
                AssignmentStatus::Bumped | AssignmentStatus::Committed => {}
            }
        }

        let decided = stats.scheduled + stats.failed;
        stats.placement_rate = if decided == 0 {
            1.0
        } else {
            stats.scheduled as f64 / decided as f64
        };
        stats
    }

    /// Whether the run meets a minimum placement rate.
    pub fn meets_threshold(&self, min_placement_rate: f64) -> bool {
        self.placement_rate >= min_placement_rate
    }
}
