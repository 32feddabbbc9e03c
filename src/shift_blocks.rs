//! Shift block allocation.
//!
//! Staggers one day's block-governed events across the eight arrival blocks.
//!
//! # Algorithm
//!
//! 1. Blocks held by committed work stay put and are not handed out fresh.
//! 2. The lead of the day's first request takes block 1, even when committed
//!    work of another employee already holds it. A lead whose committed work
//!    holds a block keeps that block.
//! 3. Every other employee, in request order, takes the lowest free block.
//! 4. Once all blocks are held, further employees reuse blocks in
//!    interleaved position order (1st, 3rd, 5th, 7th, 2nd, 4th, 6th, 8th)
//!    over the reusable blocks, so arrivals stay spread out instead of
//!    clumping late. Block 1 is not reusable while the lead holds it.
//! 5. An employee holds at most one block per day: later requests of the same
//!    employee share the first block, committed or not.
//!
//! With the lead holding block 1 the ninth request gets block 2; without a
//! lead, overflow follows 1, 3, 5, 7, 2, 4, 6, 8 literally.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveTime;
use tracing::debug;

use crate::models::{EmployeeId, EventId, ShiftBlockConfig};

/// An event placed on a day that needs a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRequest {
    /// Event to place.
    pub event_id: EventId,
    /// Employee working it.
    pub employee_id: EmployeeId,
}

/// A block already held on the day by committed work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHolder {
    /// Employee holding the block.
    pub employee_id: EmployeeId,
    /// Held block number.
    pub block: u8,
}

/// Allocated block for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSlot {
    /// Event placed.
    pub event_id: EventId,
    /// Block number (1..=8).
    pub block: u8,
    /// Nominal arrival time of the block.
    pub arrival: NaiveTime,
}

/// Assigns arrival blocks for one day at a time.
#[derive(Debug, Clone)]
pub struct ShiftBlockAllocator<'c> {
    config: &'c ShiftBlockConfig,
}

impl<'c> ShiftBlockAllocator<'c> {
    /// Creates an allocator over a block configuration.
    pub fn new(config: &'c ShiftBlockConfig) -> Self {
        Self { config }
    }

    /// Allocates blocks for one day's requests, given in placement order,
    /// around the blocks `committed` work already holds.
    ///
    /// Returns one slot per request, in request order.
    pub fn allocate(
        &self,
        requests: &[BlockRequest],
        committed: &[BlockHolder],
        lead_of_day: Option<&str>,
    ) -> Vec<BlockSlot> {
        let mut numbers: Vec<u8> = self.config.blocks.iter().map(|b| b.number).collect();
        numbers.sort_unstable();
        let Some(&first) = numbers.first() else {
            return Vec::new();
        };

        let mut held: BTreeMap<&str, u8> = BTreeMap::new();
        for h in committed {
            held.entry(h.employee_id.as_str()).or_insert(h.block);
        }

        let lead_committed = lead_of_day.and_then(|lead| held.get(lead).copied());
        let lead_request =
            lead_of_day.and_then(|lead| requests.iter().find(|r| r.employee_id == lead));
        let lead_holds_first = match (lead_committed, lead_request) {
            (Some(block), _) => block == first,
            (None, Some(r)) => {
                held.insert(r.employee_id.as_str(), first);
                true
            }
            (None, None) => false,
        };

        let taken: BTreeSet<u8> = held.values().copied().collect();
        let fresh: Vec<u8> = numbers.iter().copied().filter(|n| !taken.contains(n)).collect();
        let reusable: Vec<u8> = numbers
            .iter()
            .copied()
            .skip(usize::from(lead_holds_first))
            .collect();
        let overflow = interleaved(&reusable);

        let mut next_fresh = 0;
        let mut next_overflow = 0;
        for r in requests {
            if held.contains_key(r.employee_id.as_str()) {
                continue;
            }
            let block = if next_fresh < fresh.len() {
                next_fresh += 1;
                fresh[next_fresh - 1]
            } else if overflow.is_empty() {
                first
            } else {
                next_overflow += 1;
                overflow[(next_overflow - 1) % overflow.len()]
            };
            held.insert(r.employee_id.as_str(), block);
        }

        requests
            .iter()
            .filter_map(|r| {
                let block = *held.get(r.employee_id.as_str())?;
                let arrival = self.config.arrival(block)?;
                debug!(
                    event = %r.event_id,
                    employee = %r.employee_id,
                    block,
                    "shift block allocated"
                );
                Some(BlockSlot {
                    event_id: r.event_id.clone(),
                    block,
                    arrival,
                })
            })
            .collect()
    }
}

/// Positional interleave: even positions first, then odd positions.
fn interleaved(blocks: &[u8]) -> Vec<u8> {
    blocks
        .iter()
        .step_by(2)
        .chain(blocks.iter().skip(1).step_by(2))
        .copied()
        .collect()
}
