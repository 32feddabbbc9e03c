//! Priority ordering of pending events.
//!
//! Composes dispatching rules into a sequential rule engine and buckets the
//! result into scheduling waves.
//!
//! # Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use u_roster::models::{EventType, WorkEvent};
//! use u_roster::ordering::{rules, OrderingContext, RuleEngine};
//!
//! let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
//! let soon = WorkEvent::new("B", EventType::Production, today + chrono::TimeDelta::days(2));
//! let later = WorkEvent::new("A", EventType::Production, today + chrono::TimeDelta::days(5));
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::EarliestDue)
//!     .with_rule(rules::EarliestStart);
//! let mut events = vec![&later, &soon];
//! engine.sort(&mut events, &OrderingContext::new(today));
//! assert_eq!(events[0].id, "B");
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Jackson (1955), earliest-due-date sequencing

mod context;
mod engine;
mod orderer;
pub mod rules;

pub use context::OrderingContext;
pub use engine::RuleEngine;
pub use orderer::{Exclusion, PriorityOrderer, UrgencyKey, WavePlan};

use crate::models::WorkEvent;
use std::fmt::Debug;

/// Score returned by an ordering rule.
///
/// Lower scores = higher priority (scheduled first).
pub type RuleScore = f64;

/// A rule that scores how urgently an event should be scheduled.
///
/// # Score Convention
/// **Lower score = higher priority.**
pub trait OrderingRule: Send + Sync + Debug {
    /// Rule name (e.g., "WAVE", "EDD").
    fn name(&self) -> &'static str;

    /// Scores an event in the given context.
    fn evaluate(&self, event: &WorkEvent, context: &OrderingContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
