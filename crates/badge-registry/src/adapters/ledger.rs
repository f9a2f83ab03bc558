//! In-memory payment oracle.
//!
//! Implements `FundsTransfer` over a plain balance table. Clones share the
//! same table, so a test can keep a handle after giving one to the service.

use crate::domain::value_objects::{Address, Amount};
use crate::ports::outbound::FundsTransfer;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct LedgerInner {
    balances: BTreeMap<Address, Amount>,
    transfers: u64,
    refuse: bool,
}

/// Balance table that receives drained funds.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl InMemoryLedger {
    /// Create an empty ledger that accepts transfers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance credited to `account`.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.inner
            .lock()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Number of transfers that went through.
    pub fn transfer_count(&self) -> u64 {
        self.inner.lock().transfers
    }

    /// Make every following transfer fail (or succeed again).
    pub fn set_refuse_transfers(&self, refuse: bool) {
        self.inner.lock().refuse = refuse;
    }
}

impl FundsTransfer for InMemoryLedger {
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), String> {
        let mut inner = self.inner.lock();
        if inner.refuse {
            warn!(to = ?to, amount = %amount, "ledger refused transfer");
            return Err(format!("transfer of {amount} to {to} refused"));
        }

        let balance = inner.balances.entry(to).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| format!("balance of {to} would overflow"))?;
        inner.transfers += 1;

        debug!(to = ?to, amount = %amount, "ledger transfer");
        Ok(())
    }
}
