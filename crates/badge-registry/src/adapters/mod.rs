//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports: the payment oracle and the command journal.

mod journal;
mod ledger;

pub use journal::{FileJournal, InMemoryJournal};
pub use ledger::InMemoryLedger;
