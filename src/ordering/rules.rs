//! Built-in ordering rules.
//!
//! - **WAVE**: type-priority tier
//! - **EDD**: earliest due date
//! - **EST**: earliest start date
//!
//! All rules return lower scores for more urgent events.

use super::{OrderingContext, OrderingRule, RuleScore};
use crate::models::WorkEvent;

/// Wave rank: rotation work, then lead support, general, generic.
#[derive(Debug, Clone, Copy)]
pub struct WaveRank;

impl OrderingRule for WaveRank {
    fn name(&self) -> &'static str {
        "WAVE"
    }

    fn evaluate(&self, event: &WorkEvent, _context: &OrderingContext) -> RuleScore {
        f64::from(event.wave().rank())
    }

    fn description(&self) -> &'static str {
        "Wave Rank"
    }
}

/// Earliest Due Date, in days from today.
///
/// # Reference
/// Jackson (1955), optimal for minimizing maximum lateness on a single machine.
#[derive(Debug, Clone, Copy)]
pub struct EarliestDue;

impl OrderingRule for EarliestDue {
    fn name(&self) -> &'static str {
        "EDD"
    }

    fn evaluate(&self, event: &WorkEvent, context: &OrderingContext) -> RuleScore {
        context.days_until(event.due_date) as f64
    }

    fn description(&self) -> &'static str {
        "Earliest Due Date"
    }
}

/// Earliest Start Date, in days from today.
#[derive(Debug, Clone, Copy)]
pub struct EarliestStart;

impl OrderingRule for EarliestStart {
    fn name(&self) -> &'static str {
        "EST"
    }

    fn evaluate(&self, event: &WorkEvent, context: &OrderingContext) -> RuleScore {
        context.days_until(event.start_date) as f64
    }

    fn description(&self) -> &'static str {
        "Earliest Start Date"
    }
}
