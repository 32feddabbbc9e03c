//! Wave planning.
//!
//! # Algorithm
//!
//! 1. Drop events outside the horizon window: locked events, companions
//!    (scheduled with their primary), events due before
//!    `today + min_lead_days`, events starting after `today + horizon_days`.
//! 2. Sort with the rule chain `WAVE → EDD → EST → id`.
//! 3. Inside each group of equal due dates, interleave events sharing a
//!    subject so the same subject is not scheduled back to back when another
//!    subject is available. Events never move across a due-date boundary.
//! 4. Split into waves.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{rules, OrderingContext, RuleEngine};
use crate::config::SchedulerConfig;
use crate::models::{EventId, Wave, WorkEvent};

/// Urgency of an event: wave first, then due date. Smaller = more urgent.
///
/// Shared by the orderer and the bumper so both agree on what
/// "lower priority" means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UrgencyKey {
    /// Wave of the event (companions use their primary's wave).
    pub wave: Wave,
    /// Due date.
    pub due_date: NaiveDate,
}

impl UrgencyKey {
    /// Urgency of `event`.
    pub fn of(event: &WorkEvent) -> Self {
        Self {
            wave: event.wave(),
            due_date: event.due_date,
        }
    }
}

/// Why an event was left out of the wave plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exclusion {
    /// Event is locked.
    Locked,
    /// Companion; placed together with its primary.
    Companion,
    /// Due before the minimum lead time.
    InsideLeadTime,
    /// Starts after the horizon.
    BeyondHorizon,
}

/// Ordered waves of event IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WavePlan {
    /// Waves in processing order, each sorted most-urgent first.
    pub waves: BTreeMap<Wave, Vec<EventId>>,
    /// Events not planned, with the reason.
    pub excluded: Vec<(EventId, Exclusion)>,
}

impl WavePlan {
    /// Events of `wave`, most urgent first.
    pub fn wave(&self, wave: Wave) -> &[EventId] {
        self.waves.get(&wave).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of planned events.
    pub fn len(&self) -> usize {
        self.waves.values().map(Vec::len).sum()
    }

    /// Whether nothing was planned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buckets pending events into ordered scheduling waves.
#[derive(Debug, Clone)]
pub struct PriorityOrderer {
    min_lead_days: u32,
    horizon_days: u32,
    engine: RuleEngine,
}

impl PriorityOrderer {
    /// Creates an orderer using the config's lead time and horizon.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            min_lead_days: config.min_lead_days,
            horizon_days: config.horizon_days,
            engine: RuleEngine::new()
                .with_rule(rules::WaveRank)
                .with_rule(rules::EarliestDue)
                .with_rule(rules::EarliestStart),
        }
    }

    /// Earliest due date still eligible for auto-placement.
    pub fn earliest_due(&self, today: NaiveDate) -> NaiveDate {
        today + TimeDelta::days(i64::from(self.min_lead_days))
    }

    /// Last date of the scheduling horizon.
    pub fn horizon_end(&self, today: NaiveDate) -> NaiveDate {
        today + TimeDelta::days(i64::from(self.horizon_days))
    }

    /// Why `event` would be excluded from planning, if at all.
    pub fn exclusion(&self, event: &WorkEvent, today: NaiveDate) -> Option<Exclusion> {
        if event.locked {
            Some(Exclusion::Locked)
        } else if event.event_type.is_companion() {
            Some(Exclusion::Companion)
        } else if event.due_date < self.earliest_due(today) {
            Some(Exclusion::InsideLeadTime)
        } else if event.start_date > self.horizon_end(today) {
            Some(Exclusion::BeyondHorizon)
        } else {
            None
        }
    }

    /// Orders events into waves.
    pub fn plan<'e>(
        &self,
        events: impl IntoIterator<Item = &'e WorkEvent>,
        today: NaiveDate,
    ) -> WavePlan {
        let ctx = OrderingContext::new(today);
        let mut plan = WavePlan::default();
        let mut eligible: Vec<&WorkEvent> = Vec::new();

        for event in events {
            match self.exclusion(event, today) {
                Some(reason) => {
                    debug!(event = %event.id, ?reason, "event excluded from wave plan");
                    plan.excluded.push((event.id.clone(), reason));
                }
                None => eligible.push(event),
            }
        }

        self.engine.sort(&mut eligible, &ctx);

        for (wave, group) in split_by(&eligible, |e| e.wave()) {
            let mut ordered = Vec::with_capacity(group.len());
            for (_, due_group) in split_by(group, |e| e.due_date) {
                ordered.extend(interleave_subjects(due_group).into_iter().map(|e| e.id.clone()));
            }
            plan.waves.insert(wave, ordered);
        }

        plan.excluded.sort_by(|a, b| a.0.cmp(&b.0));
        plan
    }
}

/// Splits a sorted slice into runs of equal `key`.
fn split_by<'s, 'e, K: PartialEq>(
    items: &'s [&'e WorkEvent],
    key: impl Fn(&WorkEvent) -> K,
) -> Vec<(K, &'s [&'e WorkEvent])> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=items.len() {
        if i == items.len() || key(items[i]) != key(items[start]) {
            runs.push((key(items[start]), &items[start..i]));
            start = i;
        }
    }
    runs
}

/// Greedy re-sequencing: repeatedly take the first remaining event whose
/// subject differs from the previously taken one, falling back to the first
/// remaining event. Events without a subject never conflict.
fn interleave_subjects<'e>(group: &[&'e WorkEvent]) -> Vec<&'e WorkEvent> {
    let mut remaining: Vec<&WorkEvent> = group.to_vec();
    let mut out = Vec::with_capacity(remaining.len());
    let mut last: Option<&str> = None;

    while !remaining.is_empty() {
        let pick = remaining
            .iter()
            .position(|e| match (e.subject.as_deref(), last) {
                (Some(s), Some(prev)) => s != prev,
                _ => true,
            })
            .unwrap_or(0);
        let event = remaining.remove(pick);
        last = event.subject.as_deref();
        out.push(event);
    }
    out
}
