//! Retry configuration for the orchestrators
//!
//! Both bounded loops in the agent (engine reload and recovery log polling)
//! are parameterised by an attempt count and a wait between attempts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded retry policy for reloading the engine process
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadOptions {
    /// Maximum number of reload attempts
    pub retries: u32,
    /// Wait between attempts while the process is absent
    pub wait: Duration,
}

impl ReloadOptions {
    /// Defaults used by the bootstrap orchestrator
    #[must_use]
    pub const fn bootstrap() -> Self {
        Self {
            retries: 10,
            wait: Duration::from_secs(1),
        }
    }

    /// Defaults used by the recovery orchestrator. Fewer attempts: a failed
    /// reload during recovery is not fatal.
    #[must_use]
    pub const fn recovery() -> Self {
        Self {
            retries: 3,
            wait: Duration::from_secs(1),
        }
    }
}

impl Default for ReloadOptions {
    fn default() -> Self {
        Self::bootstrap()
    }
}

/// Bounded polling policy for reading the recovered position
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryOptions {
    /// Maximum number of recovery log reads
    pub retries: u32,
    /// Wait before each read
    pub wait: Duration,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self {
            retries: 10,
            wait: Duration::from_secs(3),
        }
    }
}
