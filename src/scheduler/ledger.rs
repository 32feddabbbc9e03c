//! Append-only run ledger.
//!
//! Every state change of a run is appended as an entry; nothing is ever
//! rewritten. Entries that belong together (a primary with its companions,
//! a bump with the placement it made room for) share a transaction number,
//! so a reviewer can accept or reject them as one unit.

use serde::{Deserialize, Serialize};

use crate::models::{Assignment, AssignmentStatus, EventId};

/// Transaction number within one run.
pub type TxnId = u32;

/// What an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// An assignment was proposed.
    Proposed,
    /// An active assignment was displaced.
    Bumped,
    /// An event could not be placed.
    Failed,
    /// A proposed assignment received its final shift block.
    BlockAssigned,
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the ledger (0-based).
    pub seq: usize,
    /// Transaction this entry belongs to.
    pub txn: TxnId,
    /// Entry kind.
    pub kind: EntryKind,
    /// Assignment state after this entry.
    pub assignment: Assignment,
}

/// Append-only record of one scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLedger {
    entries: Vec<LedgerEntry>,
    next_txn: TxnId,
}

impl RunLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new transaction.
    pub fn begin(&mut self) -> TxnId {
        let txn = self.next_txn;
        self.next_txn += 1;
        txn
    }

    /// Appends an entry.
    pub fn record(&mut self, txn: TxnId, kind: EntryKind, assignment: Assignment) -> usize {
        let seq = self.entries.len();
        self.entries.push(LedgerEntry {
            seq,
            txn,
            kind,
            assignment,
        });
        seq
    }

    /// All entries, in append order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entries of one transaction.
    pub fn transaction(&self, txn: TxnId) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(move |e| e.txn == txn)
    }

    /// Entries concerning `event_id`, oldest first.
    pub fn history<'l>(&'l self, event_id: &'l str) -> impl Iterator<Item = &'l LedgerEntry> + 'l {
        self.entries
            .iter()
            .filter(move |e| e.assignment.event_id == event_id)
    }

    /// Most recent entry concerning `event_id`.
    pub fn latest(&self, event_id: &str) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.assignment.event_id == event_id)
    }

    /// Sequence number of the latest `Proposed` entry for `event_id`.
    pub fn proposed_at(&self, event_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::Proposed && e.assignment.event_id == event_id)
            .map(|e| e.seq)
    }

    /// Number of entries of `kind`.
    pub fn count(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Events displaced during the run whose displaced assignment had been
    /// committed by an earlier run, with their latest bump entry.
    pub fn bumped_committed(&self) -> Vec<&LedgerEntry> {
        let mut out: Vec<&LedgerEntry> = Vec::new();
        for e in self.entries.iter().filter(|e| e.kind == EntryKind::Bumped) {
            let first_bump = !out.iter().any(|o| o.assignment.event_id == e.assignment.event_id);
            if first_bump && self.was_committed(&e.assignment.event_id, e.seq) {
                out.push(e);
            }
        }
        out
    }

    /// Whether the bump at `seq` displaced input-committed work, i.e. no
    /// proposal for the event precedes it.
    fn was_committed(&self, event_id: &EventId, seq: usize) -> bool {
        !self.entries[..seq]
            .iter()
            .any(|e| e.kind == EntryKind::Proposed && &e.assignment.event_id == event_id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerEntry {
    /// Whether this entry leaves the event active.
    pub fn is_active(&self) -> bool {
        matches!(
            self.assignment.status,
            AssignmentStatus::Proposed | AssignmentStatus::Committed
        )
    }
}
