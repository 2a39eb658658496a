//! Engine configuration.

use std::str::FromStr;
use std::time::Duration;

use seat_store::{DEFAULT_LOCK_TIMEOUT, TransactionOptions};
use thiserror::Error;

/// When the reservation side-effect hook runs relative to the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookMode {
    /// The hook writes on the reservation's own transaction. A hook failure
    /// rolls the whole reservation back.
    #[default]
    InTransaction,

    /// The reservation commits first; the hook then runs on a fresh
    /// transaction. A hook failure is logged and counted, and the confirmed
    /// booking is still returned.
    AfterCommit,
}

impl HookMode {
    /// Returns the configuration spelling of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookMode::InTransaction => "in_transaction",
            HookMode::AfterCommit => "after_commit",
        }
    }
}

impl std::fmt::Display for HookMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A hook mode string was not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown hook mode '{0}' (expected in_transaction or after_commit)")]
pub struct ParseHookModeError(pub String);

impl FromStr for HookMode {
    type Err = ParseHookModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_transaction" => Ok(HookMode::InTransaction),
            "after_commit" => Ok(HookMode::AfterCommit),
            other => Err(ParseHookModeError(other.to_string())),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest wait for a row lock before failing with a retryable error.
    pub lock_timeout: Duration,
    /// Placement of the side-effect hook.
    pub hook_mode: HookMode,
}

impl EngineConfig {
    /// Sets the lock timeout.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Sets the hook mode.
    pub fn with_hook_mode(mut self, hook_mode: HookMode) -> Self {
        self.hook_mode = hook_mode;
        self
    }

    pub(crate) fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions::with_lock_timeout(self.lock_timeout)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            hook_mode: HookMode::default(),
        }
    }
}
