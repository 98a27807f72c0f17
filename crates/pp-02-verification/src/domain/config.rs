//! Verification subsystem configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Admission ceiling on the total number of verification records.
    pub max_verifications: u64,
    /// Per-account cooldown between provider polls, in milliseconds.
    pub poll_cooldown_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_verifications: 1_000,
            poll_cooldown_ms: 2_000,
        }
    }
}

impl VerificationConfig {
    pub fn poll_cooldown(&self) -> Duration {
        Duration::from_millis(self.poll_cooldown_ms)
    }
}
