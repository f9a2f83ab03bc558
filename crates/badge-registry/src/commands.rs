//! # Registry Commands
//!
//! The seven mutating operations as data. A command carries its caller, so a
//! journal of commands is enough to rebuild the registry deterministically.

use crate::domain::value_objects::{Address, Amount, BadgeId, BadgeName};
use serde::{Deserialize, Serialize};

/// A mutating registry operation together with the principal that sent it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryCommand {
    /// Create a badge, paying the fee.
    Register {
        /// Sender; becomes the badge owner.
        caller: Address,
        /// Address to bind.
        address: Address,
        /// Name to bind.
        name: BadgeName,
        /// Amount attached to the call.
        paid: Amount,
    },
    /// Rebind a badge to a new address (badge owner only).
    SetAddress {
        /// Sender.
        caller: Address,
        /// Badge id.
        id: BadgeId,
        /// New address.
        address: Address,
    },
    /// Write a metadata entry (badge owner only).
    SetMeta {
        /// Sender.
        caller: Address,
        /// Badge id.
        id: BadgeId,
        /// Metadata key.
        key: String,
        /// Metadata value.
        value: String,
    },
    /// Retire a badge (admin only).
    Unregister {
        /// Sender.
        caller: Address,
        /// Badge id.
        id: BadgeId,
    },
    /// Hand administration to another principal (admin only).
    SetOwner {
        /// Sender.
        caller: Address,
        /// Next admin.
        new_owner: Address,
    },
    /// Change the registration fee (admin only).
    SetFee {
        /// Sender.
        caller: Address,
        /// New fee.
        fee: Amount,
    },
    /// Pay the whole balance out to the admin (admin only).
    Drain {
        /// Sender; receives the funds.
        caller: Address,
    },
}

impl RegistryCommand {
    /// Sender of the command.
    pub fn caller(&self) -> Address {
        match self {
            Self::Register { caller, .. }
            | Self::SetAddress { caller, .. }
            | Self::SetMeta { caller, .. }
            | Self::Unregister { caller, .. }
            | Self::SetOwner { caller, .. }
            | Self::SetFee { caller, .. }
            | Self::Drain { caller } => *caller,
        }
    }

    /// Operation name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::SetAddress { .. } => "set_address",
            Self::SetMeta { .. } => "set_meta",
            Self::Unregister { .. } => "unregister",
            Self::SetOwner { .. } => "set_owner",
            Self::SetFee { .. } => "set_fee",
            Self::Drain { .. } => "drain",
        }
    }

    /// Check if the command moves funds out of the registry.
    pub fn is_drain(&self) -> bool {
        matches!(self, Self::Drain { .. })
    }
}

/// What a successfully applied command produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// `register` allocated this id.
    Registered(BadgeId),
    /// `drain` paid out this amount (zero when the balance was empty).
    Drained(Amount),
    /// Any other command.
    Applied,
}
