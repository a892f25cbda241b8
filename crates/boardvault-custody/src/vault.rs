//! Custody vault - the capability-checked call surface
//!
//! Wraps the release workflow with the journal, the audit log and the payout
//! rail. Every call takes the already-authenticated caller identity.

use std::sync::Arc;

use boardvault_common::{
    AuditCategory, AuditLogger, Identity, Result, TreasuryError, VaultError, WorkflowError,
    BOARD_SIZE, FUND_UNIT,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::board::BoardRegistry;
use crate::journal::{CustodyJournal, JournalEvent};
use crate::payout::PayoutRail;
use crate::policy::ReleasePolicy;
use crate::workflow::{ReleaseCycle, ReleaseReceipt, ReleaseState, ReleaseWorkflow, SignOutcome};

/// Construction options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultOptions {
    /// Required number of board members
    pub board_size: usize,
    pub policy: ReleasePolicy,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            policy: ReleasePolicy::default(),
        }
    }
}

/// Point-in-time view of the vault
#[derive(Debug, Clone, Serialize)]
pub struct VaultSnapshot {
    pub unit: &'static str,
    pub balance: Decimal,
    pub total_deposited: Decimal,
    pub total_released: Decimal,
    pub state: ReleaseState,
    pub release_requested: bool,
    pub signature_count: usize,
    pub board_size: usize,
    pub cycle: Option<ReleaseCycle>,
    pub signers: Vec<Identity>,
    pub initiator: Identity,
    pub policy: ReleasePolicy,
    pub releases_completed: u64,
    pub journal_revision: u64,
}

/// Pooled-funds custody with unanimous board release
pub struct CustodyVault {
    workflow: ReleaseWorkflow,
    journal: CustodyJournal,
    audit: AuditLogger,
    rail: Arc<dyn PayoutRail>,
}

impl CustodyVault {
    /// Construct a vault with the default board size and policy
    pub fn new(
        members: Vec<Identity>,
        initiator: Identity,
        rail: Arc<dyn PayoutRail>,
    ) -> Result<Self> {
        Self::open(members, initiator, rail, VaultOptions::default(), AuditLogger::new())
    }

    /// Construct a vault
    ///
    /// Fails with `InvalidBoardSize` or `DuplicateMember`; no vault exists
    /// afterwards.
    pub fn open(
        members: Vec<Identity>,
        initiator: Identity,
        rail: Arc<dyn PayoutRail>,
        options: VaultOptions,
        audit: AuditLogger,
    ) -> Result<Self> {
        let board = match BoardRegistry::new(members, options.board_size) {
            Ok(board) => board,
            Err(e) => {
                let err = VaultError::from(e);
                audit.log_rejected(AuditCategory::Setup, "construct", initiator.as_str(), None, err.code());
                return Err(err);
            }
        };

        let mut journal = CustodyJournal::new();
        journal.append(
            JournalEvent::VaultOpened {
                initiator: initiator.to_string(),
                board: board.members().iter().map(Identity::to_string).collect(),
            },
            None,
        )?;
        audit.log_accepted(
            AuditCategory::Setup,
            "construct",
            initiator.as_str(),
            None,
            &[("board_size", board.size().to_string())],
        );

        Ok(Self {
            workflow: ReleaseWorkflow::new(board, initiator, options.policy),
            journal,
            audit,
            rail,
        })
    }

    /// Deposit funds from any caller. Returns the new balance.
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn deposit(&mut self, caller: &Identity, amount: Decimal) -> Result<Decimal> {
        let balance = match self.workflow.deposit(amount, caller) {
            Ok(balance) => balance,
            Err(e) => return Err(self.rejected(AuditCategory::Deposit, "deposit", caller, e.into())),
        };

        self.record(
            JournalEvent::FundsDeposited {
                depositor: caller.to_string(),
                amount,
                balance,
            },
            self.cycle_id(),
        );
        self.audit.log_accepted(
            AuditCategory::Deposit,
            "deposit",
            caller.as_str(),
            self.cycle_label().as_deref(),
            &[("amount", amount.to_string()), ("balance", balance.to_string())],
        );
        Ok(balance)
    }

    /// Open a release cycle (privileged initiator only)
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn request_release(&mut self, caller: &Identity) -> Result<ReleaseCycle> {
        let cycle = match self.workflow.request_release(caller) {
            Ok(cycle) => cycle,
            Err(e) => {
                return Err(self.rejected(AuditCategory::ReleaseRequest, "request_release", caller, e.into()))
            }
        };

        self.record(
            JournalEvent::ReleaseRequested {
                initiator: caller.to_string(),
                number: cycle.number,
            },
            Some(cycle.id),
        );
        self.audit.log_accepted(
            AuditCategory::ReleaseRequest,
            "request_release",
            caller.as_str(),
            Some(&cycle.id.to_string()),
            &[("number", cycle.number.to_string())],
        );
        Ok(cycle)
    }

    /// Sign the open release request (board members only)
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn sign_release(&mut self, caller: &Identity) -> Result<SignOutcome> {
        let outcome = match self.workflow.sign_release(caller) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.rejected(AuditCategory::Signature, "sign_release", caller, e.into())),
        };
        let cycle_id = self.cycle_id();

        if outcome.recorded {
            self.record(
                JournalEvent::ReleaseSigned {
                    member: caller.to_string(),
                    signature_count: outcome.signature_count,
                },
                cycle_id,
            );
        }
        if outcome.became_fully_signed {
            self.record(
                JournalEvent::ReleaseFullySigned {
                    signature_count: outcome.signature_count,
                },
                cycle_id,
            );
        }
        self.audit.log_accepted(
            AuditCategory::Signature,
            "sign_release",
            caller.as_str(),
            self.cycle_label().as_deref(),
            &[
                ("recorded", outcome.recorded.to_string()),
                ("signature_count", outcome.signature_count.to_string()),
            ],
        );
        Ok(outcome)
    }

    /// Release the whole treasury to `recipient` once every member signed
    #[instrument(skip(self), fields(caller = %caller, recipient = %recipient))]
    pub fn release_funds(&mut self, caller: &Identity, recipient: &Identity) -> Result<ReleaseReceipt> {
        let cycle_id = self.cycle_id();
        let amount = self.workflow.balance();

        let receipt = match self.workflow.release_funds(caller, recipient, self.rail.as_ref()) {
            Ok(receipt) => receipt,
            Err(err @ VaultError::Treasury(TreasuryError::TransferFailed { .. })) => {
                let reason = err.to_string();
                self.record(
                    JournalEvent::ReleaseFailed {
                        executed_by: caller.to_string(),
                        recipient: recipient.to_string(),
                        amount,
                        reason: reason.clone(),
                    },
                    cycle_id,
                );
                self.audit.log_transfer_failure(
                    caller.as_str(),
                    self.cycle_label().as_deref(),
                    recipient.as_str(),
                    &reason,
                );
                return Err(err);
            }
            Err(err) => return Err(self.rejected(AuditCategory::Release, "release_funds", caller, err)),
        };

        self.record(
            JournalEvent::FundsReleased {
                executed_by: caller.to_string(),
                recipient: recipient.to_string(),
                amount: receipt.amount,
                signers: receipt.signers.iter().map(Identity::to_string).collect(),
            },
            Some(receipt.cycle.id),
        );
        self.audit.log_accepted(
            AuditCategory::Release,
            "release_funds",
            caller.as_str(),
            Some(&receipt.cycle.id.to_string()),
            &[
                ("recipient", recipient.to_string()),
                ("amount", receipt.amount.to_string()),
            ],
        );
        Ok(receipt)
    }

    /// Abandon the open release request, if the policy allows it
    #[instrument(skip(self), fields(caller = %caller))]
    pub fn cancel_release(&mut self, caller: &Identity) -> Result<ReleaseCycle> {
        let signature_count = self.workflow.signature_count();
        let cycle = match self.workflow.cancel_release(caller) {
            Ok(cycle) => cycle,
            Err(e) => {
                return Err(self.rejected(AuditCategory::ReleaseRequest, "cancel_release", caller, e.into()))
            }
        };

        self.record(
            JournalEvent::ReleaseCancelled {
                cancelled_by: caller.to_string(),
                signature_count,
            },
            Some(cycle.id),
        );
        self.audit.log_accepted(
            AuditCategory::ReleaseRequest,
            "cancel_release",
            caller.as_str(),
            Some(&cycle.id.to_string()),
            &[("discarded_signatures", signature_count.to_string())],
        );
        Ok(cycle)
    }

    fn rejected(
        &self,
        category: AuditCategory,
        action: &str,
        caller: &Identity,
        err: VaultError,
    ) -> VaultError {
        debug!(action, error = %err, "Call rejected");
        let category = match err {
            VaultError::Workflow(WorkflowError::Unauthorized { .. }) => AuditCategory::Authorization,
            _ => category,
        };
        self.audit.log_rejected(
            category,
            action,
            caller.as_str(),
            self.cycle_label().as_deref(),
            err.code(),
        );
        err
    }

    /// Journal an event for a call that has already taken effect
    ///
    /// Failures are logged, not returned: the state change stands.
    fn record(&mut self, event: JournalEvent, cycle_id: Option<Uuid>) {
        let event_type = event.event_type();
        if let Err(err) = self.journal.append(event, cycle_id) {
            error!(event_type, error = %err, "Failed to journal custody event");
        }
    }

    fn cycle_id(&self) -> Option<Uuid> {
        self.workflow.current_cycle().map(|c| c.id)
    }

    fn cycle_label(&self) -> Option<String> {
        self.cycle_id().map(|id| id.to_string())
    }

    // Queries

    pub fn balance(&self) -> Decimal {
        self.workflow.balance()
    }

    pub fn release_requested(&self) -> bool {
        self.workflow.release_requested()
    }

    pub fn has_signed(&self, member: &Identity) -> bool {
        self.workflow.has_signed(member)
    }

    pub fn signature_count(&self) -> usize {
        self.workflow.signature_count()
    }

    pub fn state(&self) -> ReleaseState {
        self.workflow.state()
    }

    pub fn is_member(&self, identity: &Identity) -> bool {
        self.workflow.board().is_member(identity)
    }

    pub fn workflow(&self) -> &ReleaseWorkflow {
        &self.workflow
    }

    pub fn journal(&self) -> &CustodyJournal {
        &self.journal
    }

    pub fn rail(&self) -> &Arc<dyn PayoutRail> {
        &self.rail
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        let treasury = self.workflow.treasury();
        VaultSnapshot {
            unit: FUND_UNIT,
            balance: treasury.balance(),
            total_deposited: treasury.total_deposited(),
            total_released: treasury.total_released(),
            state: self.workflow.state(),
            release_requested: self.workflow.release_requested(),
            signature_count: self.workflow.signature_count(),
            board_size: self.workflow.board().size(),
            cycle: self.workflow.current_cycle().cloned(),
            signers: self.workflow.signers(),
            initiator: self.workflow.initiator().clone(),
            policy: self.workflow.policy(),
            releases_completed: self.workflow.releases_completed(),
            journal_revision: self.journal.next_revision(),
        }
    }
}
