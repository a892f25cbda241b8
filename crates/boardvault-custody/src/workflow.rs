//! Release workflow state machine
//!
//! ```text
//!            request_release            N-th signature
//!   Idle ───────────────────▶ Pending ───────────────▶ FullySigned
//!    ▲                          │                          │
//!    │        cancel_release    │                          │ release_funds
//!    ├──────────────────────────┘                          │ (transfer ok)
//!    └─────────────────────────────────────────────────────┘
//! ```
//!
//! The workflow exclusively owns the treasury and the signature tracker.
//! Every operation takes `&mut self`, so callers admitted one at a time see
//! each call as a single atomic step. A guard violation never changes state.

use boardvault_common::{Identity, Result, TreasuryError, VaultError, WorkflowError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::board::BoardRegistry;
use crate::payout::PayoutRail;
use crate::policy::{ReleasePolicy, ReleaseTrigger};
use crate::signatures::SignatureTracker;
use crate::treasury::TreasuryLedger;

/// Workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    /// No pending request
    Idle,
    /// Request open, fewer than N signatures
    Pending,
    /// Every board member signed; release permitted
    FullySigned,
}

impl std::fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseState::Idle => write!(f, "idle"),
            ReleaseState::Pending => write!(f, "pending"),
            ReleaseState::FullySigned => write!(f, "fully_signed"),
        }
    }
}

/// One request→signatures→release sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCycle {
    pub id: Uuid,
    /// 1-based sequence number
    pub number: u64,
    /// Unix millis
    pub opened_at: i64,
}

/// Result of a signing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignOutcome {
    /// `false` when the member had already signed this cycle
    pub recorded: bool,
    pub signature_count: usize,
    /// `true` only on the call that completed unanimity
    pub became_fully_signed: bool,
}

/// Completed release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseReceipt {
    pub cycle: ReleaseCycle,
    pub recipient: Identity,
    pub amount: Decimal,
    pub executed_by: Identity,
    /// Board members whose signatures authorized this release
    pub signers: Vec<Identity>,
    pub executed_at: i64,
}

/// Unanimous release state machine
#[derive(Debug, Clone)]
pub struct ReleaseWorkflow {
    board: BoardRegistry,
    treasury: TreasuryLedger,
    tracker: SignatureTracker,
    state: ReleaseState,
    initiator: Identity,
    policy: ReleasePolicy,
    cycle: Option<ReleaseCycle>,
    cycles_opened: u64,
    releases_completed: u64,
}

impl ReleaseWorkflow {
    /// Create an idle workflow over an empty treasury
    pub fn new(board: BoardRegistry, initiator: Identity, policy: ReleasePolicy) -> Self {
        Self {
            board,
            treasury: TreasuryLedger::new(),
            tracker: SignatureTracker::new(),
            state: ReleaseState::Idle,
            initiator,
            policy,
            cycle: None,
            cycles_opened: 0,
            releases_completed: 0,
        }
    }

    /// Credit a deposit from any caller
    pub fn deposit(
        &mut self,
        amount: Decimal,
        from: &Identity,
    ) -> std::result::Result<Decimal, TreasuryError> {
        self.treasury.deposit(amount, from)
    }

    /// Open a new release cycle
    pub fn request_release(
        &mut self,
        caller: &Identity,
    ) -> std::result::Result<ReleaseCycle, WorkflowError> {
        if caller != &self.initiator {
            return Err(self.unauthorized(caller, "request a release"));
        }
        if self.state != ReleaseState::Idle {
            return Err(WorkflowError::ReleaseAlreadyRequested);
        }

        self.tracker.reset();
        self.cycles_opened += 1;
        let cycle = ReleaseCycle {
            id: Uuid::now_v7(),
            number: self.cycles_opened,
            opened_at: chrono::Utc::now().timestamp_millis(),
        };
        self.cycle = Some(cycle.clone());
        self.state = ReleaseState::Pending;

        info!(cycle = %cycle.id, number = cycle.number, "Release requested");
        Ok(cycle)
    }

    /// Record a board member's signature on the open request
    ///
    /// Membership is checked before the pending check, so a non-member
    /// always gets `NotBoardMember` regardless of state.
    pub fn sign_release(
        &mut self,
        caller: &Identity,
    ) -> std::result::Result<SignOutcome, WorkflowError> {
        if !self.board.is_member(caller) {
            return Err(WorkflowError::NotBoardMember(caller.to_string()));
        }
        if self.state == ReleaseState::Idle {
            return Err(WorkflowError::NoReleasePending);
        }

        let recorded = self.tracker.record_signature(caller);
        let signature_count = self.tracker.count();
        let became_fully_signed =
            self.state == ReleaseState::Pending && signature_count == self.board.size();
        if became_fully_signed {
            self.state = ReleaseState::FullySigned;
            info!(signatures = signature_count, "Release fully signed");
        } else if !recorded {
            debug!(member = %caller, "Repeated signature ignored");
        }

        Ok(SignOutcome {
            recorded,
            signature_count,
            became_fully_signed,
        })
    }

    /// Transfer the whole treasury to `recipient` and return to `Idle`
    ///
    /// If the transfer fails the workflow stays `FullySigned` and the call
    /// can be retried without collecting signatures again.
    pub fn release_funds(
        &mut self,
        caller: &Identity,
        recipient: &Identity,
        rail: &dyn PayoutRail,
    ) -> Result<ReleaseReceipt> {
        if self.policy.trigger == ReleaseTrigger::Initiator && caller != &self.initiator {
            return Err(self.unauthorized(caller, "release funds").into());
        }
        if self.state != ReleaseState::FullySigned {
            return Err(WorkflowError::SignaturesIncomplete {
                signed: self.tracker.count(),
                required: self.board.size(),
            }
            .into());
        }
        let cycle = self
            .cycle
            .clone()
            .ok_or_else(|| VaultError::Internal("fully signed without an open cycle".into()))?;

        let amount = self.treasury.withdraw_all(recipient, rail)?;

        let signers = self.tracker.signers();
        self.tracker.reset();
        self.cycle = None;
        self.state = ReleaseState::Idle;
        self.releases_completed += 1;

        info!(cycle = %cycle.id, %recipient, %amount, "Funds released");
        Ok(ReleaseReceipt {
            cycle,
            recipient: recipient.clone(),
            amount,
            executed_by: caller.clone(),
            signers,
            executed_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Abandon the open request, discarding its signatures
    pub fn cancel_release(
        &mut self,
        caller: &Identity,
    ) -> std::result::Result<ReleaseCycle, WorkflowError> {
        if !self.policy.allow_cancel {
            return Err(WorkflowError::CancellationDisabled);
        }
        if caller != &self.initiator {
            return Err(self.unauthorized(caller, "cancel a release"));
        }
        let cycle = self.cycle.take().ok_or(WorkflowError::NoReleasePending)?;

        self.tracker.reset();
        self.state = ReleaseState::Idle;

        info!(cycle = %cycle.id, "Release cancelled");
        Ok(cycle)
    }

    fn unauthorized(&self, caller: &Identity, operation: &str) -> WorkflowError {
        WorkflowError::Unauthorized {
            caller: caller.to_string(),
            operation: operation.to_string(),
        }
    }

    // Queries

    /// `true` while a request is open
    pub fn release_requested(&self) -> bool {
        self.state != ReleaseState::Idle
    }

    pub fn has_signed(&self, member: &Identity) -> bool {
        self.tracker.has_signed(member)
    }

    pub fn signature_count(&self) -> usize {
        self.tracker.count()
    }

    pub fn state(&self) -> ReleaseState {
        self.state
    }

    pub fn balance(&self) -> Decimal {
        self.treasury.balance()
    }

    pub fn treasury(&self) -> &TreasuryLedger {
        &self.treasury
    }

    pub fn board(&self) -> &BoardRegistry {
        &self.board
    }

    pub fn initiator(&self) -> &Identity {
        &self.initiator
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    pub fn current_cycle(&self) -> Option<&ReleaseCycle> {
        self.cycle.as_ref()
    }

    pub fn signers(&self) -> Vec<Identity> {
        self.tracker.signers()
    }

    pub fn releases_completed(&self) -> u64 {
        self.releases_completed
    }
}
