//! Payout rails
//!
//! A payout rail moves released funds to an external recipient. The
//! treasury only debits its balance after the rail reports success.

use std::collections::{HashMap, HashSet};

use boardvault_common::{Identity, PayoutError};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::debug;

/// Moves funds out of custody to a recipient
pub trait PayoutRail: Send + Sync {
    /// Transfer `amount` to `recipient`. Must not partially apply on error.
    fn transfer(&self, recipient: &Identity, amount: Decimal) -> Result<(), PayoutError>;
}

/// In-process rail crediting recipient accounts held in memory
#[derive(Debug, Default)]
pub struct InMemoryPayoutRail {
    balances: RwLock<HashMap<Identity, Decimal>>,
    rejecting: RwLock<HashSet<Identity>>,
}

impl InMemoryPayoutRail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `recipient` refuse incoming transfers
    pub fn reject_from(&self, recipient: &Identity) {
        self.rejecting.write().insert(recipient.clone());
    }

    /// Let `recipient` accept transfers again
    pub fn accept_from(&self, recipient: &Identity) {
        self.rejecting.write().remove(recipient);
    }

    /// Funds received by `recipient` so far
    pub fn balance_of(&self, recipient: &Identity) -> Decimal {
        self.balances
            .read()
            .get(recipient)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl PayoutRail for InMemoryPayoutRail {
    fn transfer(&self, recipient: &Identity, amount: Decimal) -> Result<(), PayoutError> {
        if self.rejecting.read().contains(recipient) {
            debug!(%recipient, %amount, "Recipient rejected transfer");
            return Err(PayoutError::Rejected);
        }

        let mut balances = self.balances.write();
        let entry = balances.entry(recipient.clone()).or_insert(Decimal::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| PayoutError::Unavailable("recipient balance overflow".to_string()))?;
        Ok(())
    }
}
