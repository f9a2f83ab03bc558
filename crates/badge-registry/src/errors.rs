//! # Error Types
//!
//! Errors of the persistence and service layers. Domain rejections live in
//! [`crate::domain::errors::RegistryError`].

use crate::domain::errors::RegistryError;
use thiserror::Error;

// =============================================================================
// JOURNAL ERRORS
// =============================================================================

/// Errors from the command journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Filesystem failure.
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("journal codec error: {0}")]
    Codec(String),

    /// A record arrived out of order.
    #[error("journal sequence gap: expected {expected}, got {got}")]
    SequenceGap {
        /// Next sequence the journal expected
        expected: u64,
        /// Sequence that was offered
        got: u64,
    },

    /// An earlier append failed and could not be rolled back.
    #[error("journal {0} is poisoned by an unrecoverable write failure")]
    Poisoned(String),
}

impl From<bincode::Error> for JournalError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

// =============================================================================
// SERVICE ERRORS
// =============================================================================

/// Errors surfaced by [`crate::service::RegistryService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The registry rejected the operation. State is unchanged.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The journal could not record the operation. State is unchanged.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// A drain outcome could not be journaled. Reads still work; every
    /// further mutation is refused until the service is reopened.
    #[error("registry service halted: {0}")]
    Halted(String),
}

impl ServiceError {
    /// The domain error, if this is one.
    #[must_use]
    pub fn as_registry(&self) -> Option<&RegistryError> {
        match self {
            Self::Registry(e) => Some(e),
            Self::Journal(_) | Self::Halted(_) => None,
        }
    }
}
