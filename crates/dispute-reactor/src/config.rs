//! Configuration of the dispute reactor.

use std::time::Duration;

use rollup_validator_primitives::buf::Address;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_TRACKED_SUBMISSIONS, DEFAULT_SHUTDOWN_TIMEOUT};

/// The configuration values that dictate the behavior of the reactor.
///
/// None of these values are consensus-critical; they only affect which contract the local stakers
/// talk to and how the node behaves when it stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactorConfig {
    /// Address of the rollup contract every local staker binds to.
    pub rollup_address: Address,

    /// Maximum number of in-flight submissions whose task handles are retained for diagnostics.
    ///
    /// Handles beyond this bound are detached, the submissions themselves keep running.
    #[serde(default = "default_max_tracked_submissions")]
    pub max_tracked_submissions: usize,

    /// How long shutdown waits for in-flight submissions before giving up on them.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: Duration,
}

impl ReactorConfig {
    /// Creates a config for the given rollup contract with default values everywhere else.
    pub const fn new(rollup_address: Address) -> Self {
        Self {
            rollup_address,
            max_tracked_submissions: DEFAULT_MAX_TRACKED_SUBMISSIONS,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

const fn default_max_tracked_submissions() -> usize {
    DEFAULT_MAX_TRACKED_SUBMISSIONS
}

const fn default_shutdown_timeout() -> Duration {
    DEFAULT_SHUTDOWN_TIMEOUT
}
