//! Crate includes reusable utils for the validator services that handle common behavior, such as
//! initializing the tracing framework.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
