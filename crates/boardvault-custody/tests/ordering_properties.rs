//! Ordering properties
//!
//! Drives a small board through arbitrary call orderings and checks the
//! vault against a reference model after every step.

use std::collections::HashSet;
use std::sync::Arc;

use boardvault_common::{AuditLogger, Identity};
use boardvault_custody::{
    CustodyVault, InMemoryPayoutRail, ReleasePolicy, ReleaseState, VaultOptions,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

const BOARD: usize = 4;
/// Callers 0..BOARD are members, the rest are outsiders
const CALLERS: usize = BOARD + 2;

#[derive(Debug, Clone)]
enum Op {
    Deposit(u32),
    Request,
    Sign(usize),
    Release { by_owner: bool, rejecting: bool },
    Cancel,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..50).prop_map(Op::Deposit),
        Just(Op::Request),
        (0..CALLERS).prop_map(Op::Sign),
        (any::<bool>(), prop::bool::weighted(0.2))
            .prop_map(|(by_owner, rejecting)| Op::Release { by_owner, rejecting }),
        Just(Op::Cancel),
    ]
}

fn caller(i: usize) -> Identity {
    Identity::new(format!("caller-{}", i)).unwrap()
}

/// Reference model of the vault
#[derive(Default)]
struct Model {
    balance: Decimal,
    requested: bool,
    signed: HashSet<usize>,
}

proptest! {
    #[test]
    fn release_succeeds_iff_unanimous(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let rail = Arc::new(InMemoryPayoutRail::new());
        let owner = Identity::new("owner").unwrap();
        let good = Identity::new("recipient").unwrap();
        let bad = Identity::new("rejecting-recipient").unwrap();
        rail.reject_from(&bad);

        let options = VaultOptions {
            board_size: BOARD,
            policy: ReleasePolicy::default().with_cancel(true),
        };
        let members: Vec<Identity> = (0..BOARD).map(caller).collect();
        let mut vault = CustodyVault::open(members, owner.clone(), rail.clone(), options, AuditLogger::silent()).unwrap();
        let mut model = Model::default();
        let mut released_total = Decimal::ZERO;

        for op in ops {
            match op {
                Op::Deposit(n) => {
                    let amount = Decimal::from(n);
                    let result = vault.deposit(&caller(BOARD + 1), amount);
                    prop_assert_eq!(result.is_ok(), n > 0);
                    if n > 0 {
                        model.balance += amount;
                    }
                }
                Op::Request => {
                    let result = vault.request_release(&owner);
                    prop_assert_eq!(result.is_ok(), !model.requested);
                    if !model.requested {
                        model.requested = true;
                        model.signed.clear();
                    }
                }
                Op::Sign(i) => {
                    let before = vault.signature_count();
                    let result = vault.sign_release(&caller(i));
                    if i >= BOARD {
                        prop_assert_eq!(result.unwrap_err().code(), "NotBoardMember");
                        prop_assert_eq!(vault.signature_count(), before);
                    } else if !model.requested {
                        prop_assert_eq!(result.unwrap_err().code(), "NoReleasePending");
                    } else {
                        let outcome = result.unwrap();
                        prop_assert_eq!(outcome.recorded, model.signed.insert(i));
                    }
                }
                Op::Release { by_owner, rejecting } => {
                    let by = if by_owner { owner.clone() } else { caller(0) };
                    let to = if rejecting { &bad } else { &good };
                    let unanimous = model.requested && model.signed.len() == BOARD;
                    let result = vault.release_funds(&by, to);

                    if !by_owner {
                        prop_assert_eq!(result.unwrap_err().code(), "Unauthorized");
                    } else if !unanimous {
                        prop_assert_eq!(result.unwrap_err().code(), "SignaturesIncomplete");
                    } else if rejecting {
                        prop_assert_eq!(result.unwrap_err().code(), "TransferFailed");
                        prop_assert_eq!(vault.state(), ReleaseState::FullySigned);
                    } else {
                        let receipt = result.unwrap();
                        prop_assert_eq!(receipt.amount, model.balance);
                        prop_assert_eq!(receipt.signers.len(), BOARD);
                        released_total += model.balance;
                        model.balance = Decimal::ZERO;
                        model.requested = false;
                        model.signed.clear();
                    }
                }
                Op::Cancel => {
                    let result = vault.cancel_release(&owner);
                    prop_assert_eq!(result.is_ok(), model.requested);
                    model.requested = false;
                    model.signed.clear();
                }
            }

            prop_assert_eq!(vault.balance(), model.balance);
            prop_assert!(vault.balance() >= Decimal::ZERO);
            prop_assert_eq!(vault.release_requested(), model.requested);
            prop_assert_eq!(vault.signature_count(), model.signed.len());
            prop_assert!(vault.signature_count() <= BOARD);
            let expected_state = match (model.requested, model.signed.len() == BOARD) {
                (false, _) => ReleaseState::Idle,
                (true, false) => ReleaseState::Pending,
                (true, true) => ReleaseState::FullySigned,
            };
            prop_assert_eq!(vault.state(), expected_state);
        }

        prop_assert_eq!(rail.balance_of(&good), released_total);
        prop_assert_eq!(rail.balance_of(&bad), Decimal::ZERO);
        prop_assert!(vault.journal().verify_chain());
    }
}
