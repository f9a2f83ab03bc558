//! # Domain Errors
//!
//! Every rejection the registry engine can report. All variants except
//! [`RegistryError::InvariantViolation`] are ordinary caller errors and leave
//! the state untouched.

use super::value_objects::{Address, Amount, BadgeId};
use thiserror::Error;

/// Registry error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The name or the address is already bound to an active badge.
    #[error("name or address already registered")]
    AlreadyRegistered,

    /// The payment accompanying `register` is below the current fee.
    #[error("insufficient fee: required {required}, paid {paid}")]
    InsufficientFee {
        /// Current registration fee
        required: Amount,
        /// Amount sent with the call
        paid: Amount,
    },

    /// Caller is not the owner of the badge.
    #[error("caller {caller:?} does not own badge {id}")]
    NotOwner {
        /// Badge being mutated
        id: BadgeId,
        /// Rejected caller
        caller: Address,
    },

    /// Caller is not the registry admin.
    #[error("caller {caller:?} is not the registry admin")]
    NotAdmin {
        /// Rejected caller
        caller: Address,
    },

    /// Id was never issued or has been unregistered.
    #[error("badge {0} not found")]
    RecordNotFound(BadgeId),

    /// Target address of `set_address` is bound to an active badge.
    #[error("address {0:?} already taken")]
    AddressTaken(Address),

    /// No metadata entry for this key on an active badge.
    #[error("no metadata {key:?} for badge {id}")]
    MetaNotFound {
        /// Badge id
        id: BadgeId,
        /// Requested key
        key: String,
    },

    /// Badge name exceeds the byte limit.
    #[error("name too long: {len} > {max} bytes")]
    NameTooLong {
        /// Supplied length
        len: usize,
        /// Maximum length
        max: usize,
    },

    /// Crediting the payment would overflow the registry balance.
    #[error("balance overflow: holding {balance}, paid {paid}")]
    BalanceOverflow {
        /// Balance before the call
        balance: Amount,
        /// Amount sent with the call
        paid: Amount,
    },

    /// The payment oracle refused the drain transfer.
    #[error("funds transfer failed: {0}")]
    TransferFailed(String),

    /// Index lookup missed or disagreed with the record store.
    ///
    /// Under correct index maintenance this only surfaces on the
    /// address/name lookup paths for keys that are not registered.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl RegistryError {
    /// Returns true if the caller is expected to handle this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }

    /// Short label used for metrics and structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered => "already_registered",
            Self::InsufficientFee { .. } => "insufficient_fee",
            Self::NotOwner { .. } => "not_owner",
            Self::NotAdmin { .. } => "not_admin",
            Self::RecordNotFound(_) => "record_not_found",
            Self::AddressTaken(_) => "address_taken",
            Self::MetaNotFound { .. } => "meta_not_found",
            Self::NameTooLong { .. } => "name_too_long",
            Self::BalanceOverflow { .. } => "balance_overflow",
            Self::TransferFailed(_) => "transfer_failed",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }
}
