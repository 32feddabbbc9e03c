//! Sequential rule engine.
//!
//! Applies ordering rules in sequence, consulting the next rule only on ties.
//! Events tied on every rule are ordered by ID, so the order never depends on
//! input order.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use super::{OrderingContext, OrderingRule};
use crate::models::WorkEvent;

/// A composable rule engine for event prioritization.
///
/// # Example
/// ```
/// use u_roster::ordering::{rules, RuleEngine};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::WaveRank)
///     .with_rule(rules::EarliestDue);
/// assert_eq!(engine.rule_names(), vec!["WAVE", "EDD"]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn OrderingRule>>,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// Appends a rule; earlier rules dominate later ones.
    pub fn with_rule<R: OrderingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Names of the configured rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Sorts event references by priority (most urgent first).
    pub fn sort(&self, events: &mut [&WorkEvent], context: &OrderingContext) {
        events.sort_by(|a, b| self.compare(a, b, context));
    }

    /// Compares two events rule by rule, then by ID.
    pub fn compare(&self, a: &WorkEvent, b: &WorkEvent, context: &OrderingContext) -> Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.total_cmp(&score_b);
            }
        }
        a.id.cmp(&b.id)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .finish()
    }
}
