//! Shift block configuration.
//!
//! Block-governed events are staggered across eight numbered arrival slots.
//! Block numbers are 1-based and map to fixed nominal arrival times.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::Interval;

/// Number of arrival blocks per day.
pub const BLOCK_COUNT: u8 = 8;

/// One arrival block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftBlock {
    /// Block number (1..=8).
    pub number: u8,
    /// Nominal arrival time.
    pub arrival: NaiveTime,
}

/// The eight ordered arrival blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftBlockConfig {
    /// Blocks, expected to be numbered 1..=8 with non-decreasing arrivals.
    pub blocks: Vec<ShiftBlock>,
}

impl ShiftBlock {
    /// Creates a block.
    pub fn new(number: u8, arrival: NaiveTime) -> Self {
        Self { number, arrival }
    }
}

impl ShiftBlockConfig {
    /// Creates a config from `(number, arrival)` blocks.
    pub fn new(blocks: Vec<ShiftBlock>) -> Self {
        Self { blocks }
    }

    /// Creates a config from eight arrival times, numbered in order.
    pub fn from_arrivals(arrivals: [NaiveTime; BLOCK_COUNT as usize]) -> Self {
        let blocks = arrivals
            .iter()
            .enumerate()
            .map(|(i, &t)| ShiftBlock::new(i as u8 + 1, t))
            .collect();
        Self { blocks }
    }

    /// Nominal arrival time of block `number`.
    pub fn arrival(&self, number: u8) -> Option<NaiveTime> {
        self.blocks
            .iter()
            .find(|b| b.number == number)
            .map(|b| b.arrival)
    }

    /// Earliest arrival across all blocks.
    pub fn first_arrival(&self) -> Option<NaiveTime> {
        self.blocks.iter().map(|b| b.arrival).min()
    }

    /// Latest arrival across all blocks.
    pub fn last_arrival(&self) -> Option<NaiveTime> {
        self.blocks.iter().map(|b| b.arrival).max()
    }

    /// The span a block-governed event may occupy on `date` before its block
    /// is known: `[first arrival, last arrival + duration)`.
    pub fn envelope(&self, date: NaiveDate, duration_minutes: u32) -> Option<Interval> {
        let first = self.first_arrival()?;
        let last = self.last_arrival()?;
        let start = NaiveDateTime::new(date, first);
        let end = NaiveDateTime::new(date, last) + TimeDelta::minutes(i64::from(duration_minutes));
        Some(Interval::new(start, end))
    }
}

impl Default for ShiftBlockConfig {
    /// Quarter-hour staggered arrivals from 09:45 to 11:30.
    fn default() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        Self::from_arrivals([
            t(9, 45),
            t(10, 0),
            t(10, 15),
            t(10, 30),
            t(10, 45),
            t(11, 0),
            t(11, 15),
            t(11, 30),
        ])
    }
}
