//! Registry configuration.

use crate::domain::value_objects::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// One ether in wei.
pub const ONE_ETHER: u64 = 1_000_000_000_000_000_000;

/// Configuration applied when a registry is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Principal that receives admin rights at initialization.
    pub initial_admin: Address,

    /// Registration fee at initialization.
    pub default_fee: Amount,

    /// File journal location. `None` keeps the journal in memory.
    pub journal_path: Option<PathBuf>,

    /// Re-validate every invariant after each accepted mutation.
    pub verify_invariants: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_admin: Address::ZERO,
            default_fee: Amount::from(ONE_ETHER),
            journal_path: None,
            verify_invariants: cfg!(debug_assertions),
        }
    }
}

impl RegistryConfig {
    /// Create config for testing.
    pub fn for_testing(admin: Address) -> Self {
        Self {
            initial_admin: admin,
            default_fee: Amount::from(ONE_ETHER),
            journal_path: None,
            verify_invariants: true,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BR_INITIAL_ADMIN`: 0x-prefixed hex address (default: zero address)
    /// - `BR_DEFAULT_FEE`: fee in wei, decimal (default: 1 ether)
    /// - `BR_JOURNAL_PATH`: journal file (default: in-memory)
    /// - `BR_VERIFY_INVARIANTS`: `true`/`1` or `false`/`0` (default: on in debug builds)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let initial_admin = match env::var("BR_INITIAL_ADMIN") {
            Ok(v) => Address::from_hex(&v).unwrap_or_else(|| {
                warn!(value = %v, "BR_INITIAL_ADMIN is not a 20-byte hex address, using default");
                defaults.initial_admin
            }),
            Err(_) => defaults.initial_admin,
        };

        let default_fee = match env::var("BR_DEFAULT_FEE") {
            Ok(v) => Amount::from_dec_str(&v).unwrap_or_else(|_| {
                warn!(value = %v, "BR_DEFAULT_FEE is not a decimal amount, using default");
                defaults.default_fee
            }),
            Err(_) => defaults.default_fee,
        };

        Self {
            initial_admin,
            default_fee,
            journal_path: env::var("BR_JOURNAL_PATH").ok().map(PathBuf::from),
            verify_invariants: env::var("BR_VERIFY_INVARIANTS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.verify_invariants),
        }
    }

    /// Builder-style fee override.
    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.default_fee = fee;
        self
    }

    /// Builder-style journal location.
    pub fn with_journal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.journal_path = Some(path.into());
        self
    }
}
