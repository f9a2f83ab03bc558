//! # Domain Entities
//!
//! Badge records, the admin/treasury state, and the shapes returned by the
//! three lookup paths.

use serde::{Deserialize, Serialize};

use super::errors::RegistryError;
use super::value_objects::{Address, Amount, BadgeId, BadgeName};

/// Lifecycle state of a badge slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BadgeStatus {
    /// Indexed and mutable by its owner.
    #[default]
    Active,
    /// Unregistered by the admin. The id is retired for good.
    Tombstoned,
}

impl BadgeStatus {
    /// Check if the slot is live.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A registry record binding a name and an address under an owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRecord {
    /// Position in the record arena.
    pub id: BadgeId,
    /// Address currently bound to the badge.
    pub address: Address,
    /// Registered name.
    pub name: BadgeName,
    /// Principal that registered the badge. Never reassigned.
    pub owner: Address,
    /// Active or tombstoned.
    pub status: BadgeStatus,
}

impl BadgeRecord {
    /// Create a new active record.
    pub fn new(id: BadgeId, address: Address, name: BadgeName, owner: Address) -> Self {
        Self {
            id,
            address,
            name,
            owner,
            status: BadgeStatus::Active,
        }
    }

    /// Check if the record is live.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Registry-wide administrative and treasury state.
///
/// Owned by one engine instance and passed explicitly to every admin-gated
/// check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminState {
    /// Principal allowed to run admin operations.
    pub owner: Address,
    /// Current registration fee.
    pub fee: Amount,
    /// Fees held by the registry, not yet drained.
    pub balance: Amount,
    /// Sum of every accepted registration payment.
    pub total_collected: Amount,
    /// Sum of every drained amount.
    pub total_drained: Amount,
}

impl AdminState {
    /// Fresh admin state with an empty treasury.
    pub fn new(owner: Address, fee: Amount) -> Self {
        Self {
            owner,
            fee,
            balance: Amount::zero(),
            total_collected: Amount::zero(),
            total_drained: Amount::zero(),
        }
    }

    /// Check if `caller` is the admin.
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    /// Balance and collected total after crediting `paid`, or
    /// `BalanceOverflow` if either would exceed `U256::MAX`.
    pub fn check_credit(&self, paid: Amount) -> Result<(Amount, Amount), RegistryError> {
        match (
            self.balance.checked_add(paid),
            self.total_collected.checked_add(paid),
        ) {
            (Some(balance), Some(total)) => Ok((balance, total)),
            _ => Err(RegistryError::BalanceOverflow {
                balance: self.balance,
                paid,
            }),
        }
    }

    /// Credit an accepted registration payment.
    pub fn credit(&mut self, paid: Amount) -> Result<(), RegistryError> {
        let (balance, total) = self.check_credit(paid)?;
        self.balance = balance;
        self.total_collected = total;
        Ok(())
    }

    /// Zero the balance after a successful drain. Returns the amount taken.
    pub fn take_balance(&mut self) -> Amount {
        let drained = std::mem::take(&mut self.balance);
        self.total_drained = self.total_drained.saturating_add(drained);
        drained
    }
}

/// Result of `badge_by_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeById {
    /// Bound address.
    pub address: Address,
    /// Registered name.
    pub name: BadgeName,
    /// Badge owner.
    pub owner: Address,
}

/// Result of `badge_by_address`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeByAddress {
    /// Badge id.
    pub id: BadgeId,
    /// Registered name.
    pub name: BadgeName,
    /// Badge owner.
    pub owner: Address,
}

/// Result of `badge_by_name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeByName {
    /// Badge id.
    pub id: BadgeId,
    /// Bound address.
    pub address: Address,
    /// Badge owner.
    pub owner: Address,
}

impl From<&BadgeRecord> for BadgeById {
    fn from(record: &BadgeRecord) -> Self {
        Self {
            address: record.address,
            name: record.name.clone(),
            owner: record.owner,
        }
    }
}

impl From<&BadgeRecord> for BadgeByAddress {
    fn from(record: &BadgeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            owner: record.owner,
        }
    }
}

impl From<&BadgeRecord> for BadgeByName {
    fn from(record: &BadgeRecord) -> Self {
        Self {
            id: record.id,
            address: record.address,
            owner: record.owner,
        }
    }
}
