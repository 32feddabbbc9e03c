//! Scheduler configuration.
//!
//! Every tunable of a run lives here. The struct deserializes with
//! `#[serde(default)]`, so callers may supply only the fields they override.
//!
//! # Example
//! ```
//! use u_roster::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::default()
//!     .with_max_bumps(2)
//!     .with_horizon_days(14);
//! assert_eq!(config.max_bumps, 2);
//! assert_eq!(config.daily_production_limit, 1);
//! ```

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::EventType;

/// How a companion's reference number matches its primary's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKey {
    /// Both references share their leading `digits` decimal digits.
    SharedPrefix {
        /// Number of leading digits compared.
        digits: u32,
    },
    /// `companion.reference == primary.reference + offset`.
    Offset(i64),
}

/// Default start time of each non-block event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTimes {
    /// Rotation production start.
    pub rotation_production: NaiveTime,
    /// Supervisory check start.
    pub supervision: NaiveTime,
    /// Fixture setup start.
    pub setup: NaiveTime,
    /// Fixture refresh start.
    pub refresh: NaiveTime,
    /// Fixture teardown start.
    pub teardown: NaiveTime,
    /// Generic task start.
    pub generic: NaiveTime,
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Events due before `today + min_lead_days` are too close to auto-place.
    pub min_lead_days: u32,
    /// Events starting after `today + horizon_days` are left for a later run.
    pub horizon_days: u32,
    /// Maximum times an event may be displaced, and bump attempts it may make.
    pub max_bumps: u32,
    /// Work due within this many days of today is never displaced.
    pub protected_window_days: u32,
    /// Failed events due within this many days get a rescue attempt.
    pub rescue_window_days: u32,
    /// Production events per employee per day (supervisors exempt).
    pub daily_production_limit: u32,
    /// Production events per employee per Sunday–Saturday week.
    pub weekly_production_limit: u32,
    /// Matching rule for supervision companions.
    pub supervision_key: PairKey,
    /// Matching rule for rotation survey companions.
    pub survey_key: PairKey,
    /// Survey start relative to its rotation production start.
    pub survey_offset_minutes: u32,
    /// Default start times for non-block event types.
    pub times: EventTimes,
}

impl Default for EventTimes {
    fn default() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        Self {
            rotation_production: t(9, 0),
            supervision: t(12, 0),
            setup: t(8, 30),
            refresh: t(14, 0),
            teardown: t(18, 0),
            generic: t(10, 0),
        }
    }
}

impl EventTimes {
    /// Default start time for a non-block, non-survey event type.
    ///
    /// Block-governed events take their block's arrival; surveys follow their
    /// primary. Both fall back to the generic time here.
    pub fn for_type(&self, event_type: EventType) -> NaiveTime {
        match event_type {
            EventType::RotationProduction => self.rotation_production,
            EventType::Supervision => self.supervision,
            EventType::Setup => self.setup,
            EventType::Refresh => self.refresh,
            EventType::Teardown => self.teardown,
            EventType::Production | EventType::RotationSurvey | EventType::Generic => self.generic,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_lead_days: 1,
            horizon_days: 21,
            max_bumps: 3,
            protected_window_days: 2,
            rescue_window_days: 3,
            daily_production_limit: 1,
            weekly_production_limit: 6,
            supervision_key: PairKey::SharedPrefix { digits: 6 },
            survey_key: PairKey::Offset(1),
            survey_offset_minutes: 480,
            times: EventTimes::default(),
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum lead time.
    pub fn with_min_lead_days(mut self, days: u32) -> Self {
        self.min_lead_days = days;
        self
    }

    /// Sets the scheduling horizon.
    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = days;
        self
    }

    /// Sets the bump limit.
    pub fn with_max_bumps(mut self, max: u32) -> Self {
        self.max_bumps = max;
        self
    }

    /// Sets the protected near-term window.
    pub fn with_protected_window_days(mut self, days: u32) -> Self {
        self.protected_window_days = days;
        self
    }

    /// Sets the rescue window.
    pub fn with_rescue_window_days(mut self, days: u32) -> Self {
        self.rescue_window_days = days;
        self
    }

    /// Sets the daily production quota.
    pub fn with_daily_production_limit(mut self, limit: u32) -> Self {
        self.daily_production_limit = limit;
        self
    }

    /// Sets the weekly production quota.
    pub fn with_weekly_production_limit(mut self, limit: u32) -> Self {
        self.weekly_production_limit = limit;
        self
    }

    /// Sets the supervision pairing rule.
    pub fn with_supervision_key(mut self, key: PairKey) -> Self {
        self.supervision_key = key;
        self
    }

    /// Sets the survey pairing rule.
    pub fn with_survey_key(mut self, key: PairKey) -> Self {
        self.survey_key = key;
        self
    }

    /// Sets the survey start offset.
    pub fn with_survey_offset_minutes(mut self, minutes: u32) -> Self {
        self.survey_offset_minutes = minutes;
        self
    }

    /// Pairing rule for a companion type.
    pub fn pair_key(&self, companion_type: EventType) -> Option<PairKey> {
        match companion_type {
            EventType::Supervision => Some(self.supervision_key),
            EventType::RotationSurvey => Some(self.survey_key),
            _ => None,
        }
    }
}

impl PairKey {
    /// Whether `companion` matches `primary` under this rule.
    pub fn matches(self, primary: u64, companion: u64) -> bool {
        match self {
            PairKey::SharedPrefix { digits } => {
                match (leading_digits(primary, digits), leading_digits(companion, digits)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            PairKey::Offset(offset) => {
                i128::from(companion) - i128::from(primary) == i128::from(offset)
            }
        }
    }
}

/// Leading `digits` decimal digits of `n`, or `None` if `n` is shorter.
fn leading_digits(n: u64, digits: u32) -> Option<u64> {
    let len = n.checked_ilog10().map_or(1, |l| l + 1);
    if digits == 0 || len < digits {
        return None;
    }
    Some(n / 10u64.pow(len - digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SchedulerConfig::default();
        assert_eq!(c.max_bumps, 3);
        assert_eq!(c.weekly_production_limit, 6);
        assert_eq!(c.pair_key(EventType::Supervision), Some(PairKey::SharedPrefix { digits: 6 }));
        assert_eq!(c.pair_key(EventType::Production), None);
        assert_eq!(
            c.times.for_type(EventType::Supervision),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_partial_deserialize() {
        let json = r#"{ "max_bumps": 1, "survey_key": { "offset": 1000 } }"#;
        let c: SchedulerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.max_bumps, 1);
        assert_eq!(c.survey_key, PairKey::Offset(1000));
        assert_eq!(c.horizon_days, 21);
    }

    #[test]
    fn test_shared_prefix() {
        let key = PairKey::SharedPrefix { digits: 6 };
        assert!(key.matches(606_001_001, 606_001_999));
        assert!(!key.matches(606_001_001, 606_002_001));
        // Shorter than the prefix never matches.
        assert!(!key.matches(12_345, 12_345));
        assert!(!PairKey::SharedPrefix { digits: 0 }.matches(1, 1));
    }

    #[test]
    fn test_offset() {
        let key = PairKey::Offset(1);
        assert!(key.matches(500, 501));
        assert!(!key.matches(501, 500));
        assert!(PairKey::Offset(-5).matches(10, 5));
    }

    #[test]
    fn test_builder() {
        let c = SchedulerConfig::new()
            .with_min_lead_days(3)
            .with_protected_window_days(1)
            .with_rescue_window_days(5)
            .with_daily_production_limit(2)
            .with_weekly_production_limit(4)
            .with_supervision_key(PairKey::Offset(10))
            .with_survey_key(PairKey::SharedPrefix { digits: 4 });
        assert_eq!(c.min_lead_days, 3);
        assert_eq!(c.protected_window_days, 1);
        assert_eq!(c.rescue_window_days, 5);
        assert_eq!(c.daily_production_limit, 2);
        assert_eq!(c.weekly_production_limit, 4);
        assert_eq!(c.supervision_key, PairKey::Offset(10));
    }
}
