//! Custody journal - append-only, hash-chained record of vault events
//!
//! Provides:
//! - Dense, revision-numbered entries
//! - A BLAKE3 chain over every entry, so edits to history are detectable
//! - Per-cycle views for auditing a single release

use boardvault_common::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Hash of the (virtual) entry preceding revision 0
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Event types recorded in the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum JournalEvent {
    /// Vault constructed
    VaultOpened {
        initiator: String,
        board: Vec<String>,
    },
    /// Deposit credited
    FundsDeposited {
        depositor: String,
        amount: Decimal,
        balance: Decimal,
    },
    /// Release cycle opened
    ReleaseRequested { initiator: String, number: u64 },
    /// First signature of a member in the current cycle
    ReleaseSigned { member: String, signature_count: usize },
    /// Unanimity reached
    ReleaseFullySigned { signature_count: usize },
    /// Treasury drained to a recipient
    FundsReleased {
        executed_by: String,
        recipient: String,
        amount: Decimal,
        signers: Vec<String>,
    },
    /// Transfer attempt failed; cycle stays fully signed
    ReleaseFailed {
        executed_by: String,
        recipient: String,
        amount: Decimal,
        reason: String,
    },
    /// Open request abandoned by the initiator
    ReleaseCancelled {
        cancelled_by: String,
        signature_count: usize,
    },
}

impl JournalEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            JournalEvent::VaultOpened { .. } => "VaultOpened",
            JournalEvent::FundsDeposited { .. } => "FundsDeposited",
            JournalEvent::ReleaseRequested { .. } => "ReleaseRequested",
            JournalEvent::ReleaseSigned { .. } => "ReleaseSigned",
            JournalEvent::ReleaseFullySigned { .. } => "ReleaseFullySigned",
            JournalEvent::FundsReleased { .. } => "FundsReleased",
            JournalEvent::ReleaseFailed { .. } => "ReleaseFailed",
            JournalEvent::ReleaseCancelled { .. } => "ReleaseCancelled",
        }
    }
}

/// A recorded event with its chain link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub revision: u64,
    pub cycle_id: Option<Uuid>,
    /// Unix millis
    pub recorded_at: i64,
    pub event: JournalEvent,
    /// Hex BLAKE3 hash of the previous entry
    pub prev_hash: String,
    /// Hex BLAKE3 hash of this entry
    pub hash: String,
}

impl JournalEntry {
    fn compute_hash(
        revision: u64,
        cycle_id: Option<Uuid>,
        recorded_at: i64,
        event: &JournalEvent,
        prev_hash: &str,
    ) -> Result<String> {
        let payload = serde_json::to_vec(event)?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(prev_hash.as_bytes());
        hasher.update(&revision.to_le_bytes());
        hasher.update(cycle_id.map(|c| *c.as_bytes()).unwrap_or([0u8; 16]).as_slice());
        hasher.update(&recorded_at.to_le_bytes());
        hasher.update(&payload);
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }
}

/// In-memory append-only journal
#[derive(Debug, Clone, Default)]
pub struct CustodyJournal {
    entries: Vec<JournalEntry>,
}

impl CustodyJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision the next appended entry will receive
    pub fn next_revision(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Append an event and return its revision
    ///
    /// Writers are serialized by the owning vault, so revisions are dense
    /// and strictly increasing.
    #[instrument(skip(self, event), fields(event_type = event.event_type()))]
    pub fn append(&mut self, event: JournalEvent, cycle_id: Option<Uuid>) -> Result<u64> {
        let revision = self.next_revision();
        let prev_hash = self.last_hash().to_string();
        let recorded_at = chrono::Utc::now().timestamp_millis();
        let hash = JournalEntry::compute_hash(revision, cycle_id, recorded_at, &event, &prev_hash)?;

        self.entries.push(JournalEntry {
            revision,
            cycle_id,
            recorded_at,
            event,
            prev_hash,
            hash,
        });

        debug!(revision, "Journal entry appended");
        Ok(revision)
    }

    /// Hash of the most recent entry, or [`GENESIS_HASH`]
    pub fn last_hash(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    /// Recompute the chain and check every link
    pub fn verify_chain(&self) -> bool {
        let mut prev = GENESIS_HASH.to_string();
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.revision != i as u64 || entry.prev_hash != prev {
                return false;
            }
            match JournalEntry::compute_hash(
                entry.revision,
                entry.cycle_id,
                entry.recorded_at,
                &entry.event,
                &entry.prev_hash,
            ) {
                Ok(hash) if hash == entry.hash => prev = hash,
                _ => return false,
            }
        }
        true
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries after `revision` (exclusive), for incremental readers
    pub fn entries_since(&self, revision: Option<u64>) -> &[JournalEntry] {
        let start = match revision {
            Some(r) => usize::try_from(r.saturating_add(1)).unwrap_or(usize::MAX),
            None => 0,
        };
        self.entries.get(start..).unwrap_or(&[])
    }

    pub fn entries_for_cycle(&self, cycle_id: Uuid) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.cycle_id == Some(cycle_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn entries_mut(&mut self) -> &mut Vec<JournalEntry> {
        &mut self.entries
    }
}
