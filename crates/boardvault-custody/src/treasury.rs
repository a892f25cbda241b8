//! Treasury ledger - pooled balance in the base fund unit
//!
//! Key characteristics:
//! - Deposits are accepted from any caller
//! - Balance never goes negative
//! - Withdrawal is all-or-nothing: the balance is only cleared after the
//!   payout rail accepted the transfer

use boardvault_common::{Identity, TreasuryError};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::payout::PayoutRail;

/// Pooled treasury balance
#[derive(Debug, Clone, Default, Serialize)]
pub struct TreasuryLedger {
    /// Current pooled balance
    balance: Decimal,

    /// Sum of all accepted deposits
    total_deposited: Decimal,

    /// Sum of all completed releases
    total_released: Decimal,

    /// Number of accepted deposits
    deposit_count: u64,
}

impl TreasuryLedger {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a deposit and return the new balance
    pub fn deposit(&mut self, amount: Decimal, from: &Identity) -> Result<Decimal, TreasuryError> {
        if amount <= Decimal::ZERO {
            return Err(TreasuryError::ZeroOrNegativeAmount);
        }

        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(TreasuryError::BalanceOverflow)?;
        let total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(TreasuryError::BalanceOverflow)?;

        self.balance = balance;
        self.total_deposited = total_deposited;
        self.deposit_count += 1;

        debug!(depositor = %from, %amount, %balance, "Deposit credited");
        Ok(balance)
    }

    /// Transfer the whole balance to `to` through `rail`
    ///
    /// Returns the amount transferred. On rail failure the balance is left
    /// untouched.
    pub(crate) fn withdraw_all(
        &mut self,
        to: &Identity,
        rail: &dyn PayoutRail,
    ) -> Result<Decimal, TreasuryError> {
        let amount = self.balance;

        if let Err(e) = rail.transfer(to, amount) {
            warn!(recipient = %to, %amount, error = %e, "Treasury transfer failed");
            return Err(TreasuryError::TransferFailed {
                recipient: to.to_string(),
                amount,
                reason: e.to_string(),
            });
        }

        self.balance = Decimal::ZERO;
        // total_released never exceeds total_deposited, so this cannot overflow
        self.total_released += amount;
        Ok(amount)
    }

    #[inline]
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn total_deposited(&self) -> Decimal {
        self.total_deposited
    }

    pub fn total_released(&self) -> Decimal {
        self.total_released
    }

    pub fn deposit_count(&self) -> u64 {
        self.deposit_count
    }
}

impl std::fmt::Display for TreasuryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Treasury(balance={}, deposited={}, released={})",
            self.balance, self.total_deposited, self.total_released
        )
    }
}
