//! End-to-end release scenarios
//!
//! Runs the custody vault through the flows a 20-member board goes through:
//! - Deposit, request, unanimous signing, release
//! - Incomplete signing
//! - Non-members and out-of-order calls
//! - Repeated cycles without carry-over

use std::sync::Arc;

use boardvault_common::{AuditLogger, Identity, WorkflowError, VaultError, BOARD_SIZE};
use boardvault_custody::{
    CustodyVault, InMemoryPayoutRail, ReleasePolicy, ReleaseState, VaultOptions,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Fixture {
    vault: CustodyVault,
    rail: Arc<InMemoryPayoutRail>,
    owner: Identity,
    recipient: Identity,
    board: Vec<Identity>,
}

fn deploy(policy: ReleasePolicy) -> Fixture {
    let board: Vec<Identity> = (0..BOARD_SIZE).map(|_| Identity::generate().0).collect();
    let owner = Identity::generate().0;
    let recipient = Identity::generate().0;
    let rail = Arc::new(InMemoryPayoutRail::new());

    let options = VaultOptions {
        policy,
        ..VaultOptions::default()
    };
    let vault = CustodyVault::open(
        board.clone(),
        owner.clone(),
        rail.clone(),
        options,
        AuditLogger::silent(),
    )
    .unwrap();

    Fixture {
        vault,
        rail,
        owner,
        recipient,
        board,
    }
}

#[cfg(test)]
mod deployment_tests {
    use super::*;

    #[test]
    fn test_deploys_idle_and_empty() {
        let f = deploy(ReleasePolicy::default());
        assert_eq!(f.vault.balance(), Decimal::ZERO);
        assert_eq!(f.vault.state(), ReleaseState::Idle);
        assert!(!f.vault.release_requested());
        assert!(f.board.iter().all(|m| f.vault.is_member(m)));
        assert!(!f.vault.is_member(&f.owner));
    }

    #[test]
    fn test_rejects_short_and_duplicate_boards() {
        let mut board: Vec<Identity> = (0..BOARD_SIZE - 1).map(|_| Identity::generate().0).collect();
        let owner = Identity::generate().0;
        let rail = Arc::new(InMemoryPayoutRail::new());

        let err = CustodyVault::new(board.clone(), owner.clone(), rail.clone()).err();
        assert_eq!(err.map(|e| e.code()), Some("InvalidBoardSize"));

        board.push(board[0].clone());
        let err = CustodyVault::new(board, owner, rail).err();
        assert_eq!(err.map(|e| e.code()), Some("DuplicateMember"));
    }
}

#[cfg(test)]
mod deposit_tests {
    use super::*;

    #[test]
    fn test_anyone_can_deposit() {
        let mut f = deploy(ReleasePolicy::default());
        let stranger = Identity::generate().0;

        f.vault.deposit(&stranger, dec!(1)).unwrap();
        f.vault.deposit(&f.board[3].clone(), dec!(2)).unwrap();
        let owner = f.owner.clone();
        assert_eq!(f.vault.deposit(&owner, dec!(0.5)).unwrap(), dec!(3.5));
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        let err = f.vault.deposit(&owner, Decimal::ZERO).unwrap_err();
        assert_eq!(err.code(), "ZeroOrNegativeAmount");
        assert_eq!(f.vault.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_deposit_during_pending_is_released() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        f.vault.deposit(&owner, dec!(5)).unwrap();
        f.vault.request_release(&owner).unwrap();
        for m in f.board.clone() {
            f.vault.sign_release(&m).unwrap();
        }
        f.vault.deposit(&owner, dec!(3)).unwrap();

        let receipt = f.vault.release_funds(&owner, &f.recipient.clone()).unwrap();
        assert_eq!(receipt.amount, dec!(8));
    }
}

#[cfg(test)]
mod release_tests {
    use super::*;

    #[test]
    fn test_request_release() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        f.vault.deposit(&owner, dec!(5)).unwrap();
        f.vault.request_release(&owner).unwrap();
        assert!(f.vault.release_requested());
    }

    #[test]
    fn test_all_members_sign() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        f.vault.deposit(&owner, dec!(5)).unwrap();
        f.vault.request_release(&owner).unwrap();

        for m in f.board.clone() {
            f.vault.sign_release(&m).unwrap();
            assert!(f.vault.has_signed(&m));
        }
        assert_eq!(f.vault.signature_count(), 20);
        assert_eq!(f.vault.state(), ReleaseState::FullySigned);
    }

    #[test]
    fn test_release_after_all_signatures() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        let recipient = f.recipient.clone();
        f.vault.deposit(&owner, dec!(10)).unwrap();
        f.vault.request_release(&owner).unwrap();
        for m in f.board.clone() {
            f.vault.sign_release(&m).unwrap();
        }

        let before = f.rail.balance_of(&recipient);
        let receipt = f.vault.release_funds(&owner, &recipient).unwrap();

        assert_eq!(receipt.amount, dec!(10));
        assert_eq!(f.rail.balance_of(&recipient) - before, dec!(10));
        assert_eq!(f.vault.balance(), Decimal::ZERO);
        assert_eq!(f.vault.state(), ReleaseState::Idle);
        assert!(!f.vault.release_requested());
        assert_eq!(f.vault.signature_count(), 0);
    }

    #[test]
    fn test_nineteen_signatures_are_not_enough() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        let recipient = f.recipient.clone();
        f.vault.deposit(&owner, dec!(10)).unwrap();
        f.vault.request_release(&owner).unwrap();
        for m in &f.board.clone()[..19] {
            f.vault.sign_release(m).unwrap();
        }

        let err = f.vault.release_funds(&owner, &recipient).unwrap_err();
        assert_eq!(
            err,
            VaultError::Workflow(WorkflowError::SignaturesIncomplete {
                signed: 19,
                required: 20
            })
        );
        assert_eq!(f.vault.balance(), dec!(10));
        assert_eq!(f.rail.balance_of(&recipient), Decimal::ZERO);
    }

    #[test]
    fn test_non_member_cannot_sign() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();

        let err = f.vault.sign_release(&owner).unwrap_err();
        assert_eq!(err.code(), "NotBoardMember");

        f.vault.request_release(&owner).unwrap();
        let err = f.vault.sign_release(&owner).unwrap_err();
        assert_eq!(err.code(), "NotBoardMember");
        assert_eq!(f.vault.signature_count(), 0);
    }

    #[test]
    fn test_member_signing_without_request() {
        let mut f = deploy(ReleasePolicy::default());
        let err = f.vault.sign_release(&f.board[0].clone()).unwrap_err();
        assert_eq!(err.code(), "NoReleasePending");
    }

    #[test]
    fn test_double_signing_counts_once() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        let member = f.board[5].clone();
        f.vault.request_release(&owner).unwrap();

        assert!(f.vault.sign_release(&member).unwrap().recorded);
        assert!(!f.vault.sign_release(&member).unwrap().recorded);
        assert_eq!(f.vault.signature_count(), 1);
    }

    #[test]
    fn test_second_request_rejected() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        f.vault.request_release(&owner).unwrap();
        let err = f.vault.request_release(&owner).unwrap_err();
        assert_eq!(err.code(), "ReleaseAlreadyRequested");
    }
}

#[cfg(test)]
mod cycle_tests {
    use super::*;

    #[test]
    fn test_signatures_do_not_carry_over() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        let recipient = f.recipient.clone();

        f.vault.deposit(&owner, dec!(10)).unwrap();
        f.vault.request_release(&owner).unwrap();
        for m in f.board.clone() {
            f.vault.sign_release(&m).unwrap();
        }
        f.vault.release_funds(&owner, &recipient).unwrap();

        f.vault.deposit(&owner, dec!(4)).unwrap();
        f.vault.request_release(&owner).unwrap();
        assert_eq!(f.vault.signature_count(), 0);
        assert!(f.board.iter().all(|m| !f.vault.has_signed(m)));

        let err = f.vault.release_funds(&owner, &recipient).unwrap_err();
        assert_eq!(err.code(), "SignaturesIncomplete");

        for m in f.board.clone() {
            f.vault.sign_release(&m).unwrap();
        }
        f.vault.release_funds(&owner, &recipient).unwrap();
        assert_eq!(f.rail.balance_of(&recipient), dec!(14));
        assert_eq!(f.vault.snapshot().releases_completed, 2);
        assert!(f.vault.journal().verify_chain());
    }

    #[test]
    fn test_rejecting_recipient_then_other_recipient() {
        let mut f = deploy(ReleasePolicy::default());
        let owner = f.owner.clone();
        let recipient = f.recipient.clone();
        let fallback = Identity::generate().0;
        f.rail.reject_from(&recipient);

        f.vault.deposit(&owner, dec!(6)).unwrap();
        f.vault.request_release(&owner).unwrap();
        for m in f.board.clone() {
            f.vault.sign_release(&m).unwrap();
        }

        let err = f.vault.release_funds(&owner, &recipient).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(f.vault.state(), ReleaseState::FullySigned);
        assert_eq!(f.vault.balance(), dec!(6));

        f.vault.release_funds(&owner, &fallback).unwrap();
        assert_eq!(f.rail.balance_of(&fallback), dec!(6));
        assert_eq!(f.rail.balance_of(&recipient), Decimal::ZERO);
    }

    #[test]
    fn test_cancelled_cycle_discards_signatures() {
        let mut f = deploy(ReleasePolicy::default().with_cancel(true));
        let owner = f.owner.clone();
        f.vault.request_release(&owner).unwrap();
        for m in &f.board.clone()[..10] {
            f.vault.sign_release(m).unwrap();
        }

        f.vault.cancel_release(&owner).unwrap();
        assert_eq!(f.vault.state(), ReleaseState::Idle);
        assert_eq!(f.vault.signature_count(), 0);

        f.vault.request_release(&owner).unwrap();
        assert!(!f.vault.has_signed(&f.board[0]));
    }
}
