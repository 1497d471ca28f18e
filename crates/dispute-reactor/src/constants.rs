//! Constants used throughout the dispute reactor.

use std::time::Duration;

/// Default number of in-flight submissions whose handles are kept for diagnostics.
pub const DEFAULT_MAX_TRACKED_SUBMISSIONS: usize = 1024;

/// Default time to wait for in-flight submissions when shutting down.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
