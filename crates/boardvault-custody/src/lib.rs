//! # BoardVault Custody
//!
//! Pooled-funds custody released only by unanimous board authorization.
//!
//! ## Components
//!
//! - **Board**: immutable registry of member identities
//! - **Treasury**: pooled balance, deposits from anyone
//! - **Signatures**: per-cycle signer set
//! - **Workflow**: request → collect signatures → release → reset
//! - **Journal**: hash-chained record of every accepted event
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CustodyVault                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────────────────────────┐  ┌────────────┐  │
//! │  │            ReleaseWorkflow             │  │  Journal   │  │
//! │  │  ┌─────────┐ ┌──────────┐ ┌─────────┐  │  │  (BLAKE3)  │  │
//! │  │  │  Board  │ │ Treasury │ │ Tracker │  │  └────────────┘  │
//! │  │  └─────────┘ └────┬─────┘ └─────────┘  │  ┌────────────┐  │
//! │  └───────────────────┼────────────────────┘  │   Audit    │  │
//! │                 PayoutRail                   └────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod board;
pub mod journal;
pub mod payout;
pub mod policy;
pub mod signatures;
pub mod treasury;
pub mod vault;
pub mod workflow;

pub use board::BoardRegistry;
pub use journal::{CustodyJournal, JournalEntry, JournalEvent};
pub use payout::{InMemoryPayoutRail, PayoutRail};
pub use policy::{ReleasePolicy, ReleaseTrigger};
pub use signatures::SignatureTracker;
pub use treasury::TreasuryLedger;
pub use vault::{CustodyVault, VaultOptions, VaultSnapshot};
pub use workflow::{ReleaseCycle, ReleaseReceipt, ReleaseState, ReleaseWorkflow, SignOutcome};
