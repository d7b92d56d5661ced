//! Value-transfer collaborator for the settlement engine
//!
//! The engine never holds currency itself; every movement of value goes
//! through the host's transfer primitive behind the [`Bank`] trait. A
//! failed transfer aborts the whole operation, so implementations must be
//! all-or-nothing: either the full amount moves or nothing does.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use crate::error::MarketError;
use crate::state::AccountId;

/// Transfer failure reported by the host.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum BankError {
    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Transfer rejected by host")]
    Rejected,
}

impl From<BankError> for MarketError {
    fn from(_: BankError) -> Self {
        // Every transfer failure surfaces as one kind at the engine boundary
        MarketError::InsufficientFunds
    }
}

/// External value-transfer primitive.
pub trait Bank {
    fn transfer(
        &mut self,
        amount: u64,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<(), BankError>;
}

/// In-memory balance table with all-or-nothing transfers. Used by tests and
/// by hosts that settle value inside the same process.
#[derive(Debug, Default)]
pub struct MemoryBank {
    balances: BTreeMap<AccountId, u64>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air.
    pub fn mint(&mut self, account: &AccountId, amount: u64) {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl Bank for MemoryBank {
    fn transfer(
        &mut self,
        amount: u64,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<(), BankError> {
        let debited = self
            .balance(from)
            .checked_sub(amount)
            .ok_or(BankError::InsufficientBalance)?;
        if from == to {
            trace!(%from, amount, "self transfer");
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(BankError::Rejected)?;

        // Both legs validated; apply atomically
        self.balances.insert(*from, debited);
        self.balances.insert(*to, credited);
        trace!(%from, %to, amount, "transfer");
        Ok(())
    }
}
