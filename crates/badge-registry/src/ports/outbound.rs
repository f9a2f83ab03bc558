//! # Outbound Ports
//!
//! Traits for the collaborators the registry depends on: the payment oracle
//! that moves drained funds, and the write-ahead journal of accepted commands.

use crate::commands::RegistryCommand;
use crate::domain::value_objects::{Address, Amount};
use crate::errors::JournalError;
use serde::{Deserialize, Serialize};

/// Payment oracle - outbound port.
///
/// Moves funds from the registry to an external account. Called by `drain`
/// inside the same serialized step that resets the balance.
pub trait FundsTransfer: Send {
    /// Credit `amount` to `to`. An `Err` means nothing moved.
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), String>;
}

/// One entry of the command journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalRecord {
    /// A command that passed its precondition checks.
    Command {
        /// Journal position.
        seq: u64,
        /// The command.
        command: RegistryCommand,
    },
    /// The command at `seq` was journaled but failed while being applied
    /// (a drain whose transfer was refused). Replay skips it.
    Abort {
        /// Position of the aborted command.
        seq: u64,
        /// Why it failed.
        reason: String,
    },
    /// The drain at `seq` moved its funds. A drain without this marker or an
    /// `Abort` is in doubt and replay keeps the balance.
    Settled {
        /// Position of the settled drain.
        seq: u64,
    },
}

impl JournalRecord {
    /// Sequence number the record refers to.
    pub fn seq(&self) -> u64 {
        match self {
            Self::Command { seq, .. } | Self::Abort { seq, .. } | Self::Settled { seq } => *seq,
        }
    }
}

/// Command journal - outbound port.
///
/// Append-only. Implementations must make an appended record durable before
/// returning `Ok`.
pub trait CommandJournal: Send {
    /// Append a record.
    fn append(&mut self, record: JournalRecord) -> Result<(), JournalError>;

    /// Every record in append order.
    fn records(&self) -> Result<Vec<JournalRecord>, JournalError>;

    /// Next free command sequence number.
    fn next_seq(&self) -> u64;
}
