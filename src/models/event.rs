//! Work event model.
//!
//! A work event is a unit of in-store work to be staffed by one employee:
//! a product demonstration, its supervisory check, a rotation task, or a
//! support task such as a fixture setup.
//!
//! # Time Representation
//! Events carry a scheduling window in whole days: the event may be placed on
//! any date in `[start_date, due_date]` (both inclusive). The time of day is
//! decided by the engine (shift block or per-type default time).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Work event identifier.
pub type EventId = String;

/// A work event to be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// Domain reference number. Paired events share a stable fragment of it.
    pub reference: u64,
    /// Event classification.
    pub event_type: EventType,
    /// Earliest date the event may be worked.
    pub start_date: NaiveDate,
    /// Latest date the event may be worked (inclusive).
    pub due_date: NaiveDate,
    /// Estimated duration in minutes.
    pub duration_minutes: u32,
    /// Explicit primary event this companion belongs to.
    pub pair_with: Option<EventId>,
    /// Subject (product line) used to avoid duplicate subjects on one day.
    pub subject: Option<String>,
    /// Locked events are never auto-placed or displaced.
    pub locked: bool,
}

/// Event type classification.
///
/// Closed set: eligibility, waves, quotas and pairing are all decided by
/// exhaustive matches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Primary production event (demonstration). Block-governed, quota counted.
    Production,
    /// Short supervisory check paired with a `Production` event.
    Supervision,
    /// Rotation-governed production task.
    RotationProduction,
    /// End-of-day survey paired with a `RotationProduction` event.
    RotationSurvey,
    /// Fixture setup (lead-only support task).
    Setup,
    /// Fixture refresh (lead-only support task).
    Refresh,
    /// Fixture teardown (lead-only support task).
    Teardown,
    /// Anything else; lowest priority.
    Generic,
}

/// Priority tier of event types, processed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Wave {
    /// Rotation-governed tasks.
    Rotation,
    /// Lead-only support tasks.
    LeadSupport,
    /// General production work.
    General,
    /// Generic low-priority tasks.
    Generic,
}

/// How tightly a companion is bound to its primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coupling {
    /// Companion must be worked by the primary's employee.
    Tight,
    /// Companion may go to a role-appropriate substitute.
    Loose,
}

impl Wave {
    /// All waves in processing order.
    pub const ALL: [Wave; 4] = [Wave::Rotation, Wave::LeadSupport, Wave::General, Wave::Generic];

    /// Zero-based rank (lower = processed earlier = more important).
    pub fn rank(self) -> u8 {
        match self {
            Wave::Rotation => 0,
            Wave::LeadSupport => 1,
            Wave::General => 2,
            Wave::Generic => 3,
        }
    }
}

impl EventType {
    /// The wave this type is scheduled in.
    ///
    /// Companion types return `None`: they are placed together with their
    /// primary and never form a wave of their own.
    pub fn wave(self) -> Option<Wave> {
        match self {
            EventType::RotationProduction => Some(Wave::Rotation),
            EventType::Setup | EventType::Refresh | EventType::Teardown => Some(Wave::LeadSupport),
            EventType::Production => Some(Wave::General),
            EventType::Generic => Some(Wave::Generic),
            EventType::Supervision | EventType::RotationSurvey => None,
        }
    }

    /// Wave used for priority comparisons; companions inherit their primary's.
    pub fn effective_wave(self) -> Wave {
        match self {
            EventType::Supervision => Wave::General,
            EventType::RotationSurvey => Wave::Rotation,
            other => other.wave().unwrap_or(Wave::Generic),
        }
    }

    /// Whether this type is a companion of some primary type.
    pub fn is_companion(self) -> bool {
        self.primary_type().is_some()
    }

    /// The primary type this companion type pairs with.
    pub fn primary_type(self) -> Option<EventType> {
        match self {
            EventType::Supervision => Some(EventType::Production),
            EventType::RotationSurvey => Some(EventType::RotationProduction),
            _ => None,
        }
    }

    /// The companion type that pairs with this primary type.
    pub fn companion_type(self) -> Option<EventType> {
        match self {
            EventType::Production => Some(EventType::Supervision),
            EventType::RotationProduction => Some(EventType::RotationSurvey),
            _ => None,
        }
    }

    /// Coupling of a companion type.
    pub fn coupling(self) -> Option<Coupling> {
        match self {
            EventType::Supervision => Some(Coupling::Loose),
            EventType::RotationSurvey => Some(Coupling::Tight),
            _ => None,
        }
    }

    /// Counted against daily and weekly production quotas.
    pub fn is_quota_counted(self) -> bool {
        matches!(self, EventType::Production)
    }

    /// Placed in one of the eight arrival shift blocks.
    pub fn is_block_governed(self) -> bool {
        matches!(self, EventType::Production)
    }

    /// Staffed from a rotation before falling back to the qualified pool.
    pub fn is_rotation_governed(self) -> bool {
        matches!(self, EventType::RotationProduction | EventType::RotationSurvey)
    }

    /// Support work preferentially given to the lead of the day.
    pub fn is_lead_support(self) -> bool {
        matches!(self, EventType::Setup | EventType::Refresh | EventType::Teardown)
    }
}

impl WorkEvent {
    /// Creates a generic one-hour event on a single day.
    pub fn new(id: impl Into<EventId>, event_type: EventType, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            reference: 0,
            event_type,
            start_date: date,
            due_date: date,
            duration_minutes: 60,
            pair_with: None,
            subject: None,
            locked: false,
        }
    }

    /// Sets the domain reference number.
    pub fn with_reference(mut self, reference: u64) -> Self {
        self.reference = reference;
        self
    }

    /// Sets the scheduling window.
    pub fn with_window(mut self, start_date: NaiveDate, due_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self.due_date = due_date;
        self
    }

    /// Sets the estimated duration.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Links this companion to an explicit primary event.
    pub fn paired_with(mut self, primary: impl Into<EventId>) -> Self {
        self.pair_with = Some(primary.into());
        self
    }

    /// Sets the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Marks the event locked.
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// The wave used for priority comparisons.
    pub fn wave(&self) -> Wave {
        self.event_type.effective_wave()
    }

    /// Whether `date` lies inside `[start_date, due_date]`.
    pub fn window_contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.due_date
    }
}
