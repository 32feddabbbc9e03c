//! Candidate employee ranking.
//!
//! [`EmployeeRanker`] is the seam where an external scoring model plugs in.
//! Scores only order candidates; they never override constraint checks.
//!
//! # Candidate Order
//!
//! 1. ranker score, descending
//! 2. role priority for the event type ([`Role::candidate_rank`])
//! 3. weekly production load, ascending (spreads work fairly)
//! 4. employee ID
//!
//! [`Role::candidate_rank`]: crate::models::Role::candidate_rank

use crate::models::{Employee, WorkEvent};

/// Scores how well an employee fits an event. Higher is tried first.
///
/// Any `Fn(&WorkEvent, &Employee) -> f64` closure is a ranker.
///
/// # Example
/// ```
/// use u_roster::models::{Employee, EventType, Role, WorkEvent};
/// use u_roster::ranking::EmployeeRanker;
/// use chrono::NaiveDate;
///
/// let prefer_e2 = |_: &WorkEvent, e: &Employee| if e.id == "E2" { 1.0 } else { 0.0 };
/// let ev = WorkEvent::new("EV", EventType::Generic, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
/// assert_eq!(prefer_e2.score(&ev, &Employee::new("E2", Role::Lead)), 1.0);
/// ```
pub trait EmployeeRanker: Send + Sync {
    /// Score of `employee` for `event`.
    fn score(&self, event: &WorkEvent, employee: &Employee) -> f64;
}

impl<F> EmployeeRanker for F
where
    F: Fn(&WorkEvent, &Employee) -> f64 + Send + Sync,
{
    fn score(&self, event: &WorkEvent, employee: &Employee) -> f64 {
        self(event, employee)
    }
}

/// Default ranker: role priority only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedRanker;

impl EmployeeRanker for RuleBasedRanker {
    fn score(&self, event: &WorkEvent, employee: &Employee) -> f64 {
        -f64::from(employee.role.candidate_rank(event.event_type))
    }
}

/// Orders `candidates` for `event`.
///
/// `load` returns the employee's current weekly production count.
pub fn rank_candidates<'e>(
    ranker: &dyn EmployeeRanker,
    event: &WorkEvent,
    candidates: impl IntoIterator<Item = &'e Employee>,
    load: impl Fn(&Employee) -> usize,
) -> Vec<&'e Employee> {
    let mut scored: Vec<(f64, u8, usize, &Employee)> = candidates
        .into_iter()
        .map(|e| {
            (
                ranker.score(event, e),
                e.role.candidate_rank(event.event_type),
                load(e),
                e,
            )
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
            .then_with(|| a.3.id.cmp(&b.3.id))
    });
    scored.into_iter().map(|(_, _, _, e)| e).collect()
}
