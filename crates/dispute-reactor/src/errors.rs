//! Error types for the dispute reactor.

use rollup_validator_primitives::buf::Address;
use thiserror::Error;

/// Errors reported by the ledger client while binding or calling the rollup contract.
#[derive(Debug, Clone, Error)]
pub enum ContractErr {
    /// The contract binding could not be constructed.
    #[error("failed to bind rollup contract at {rollup}: {reason}")]
    Binding {
        /// Address of the rollup contract.
        rollup: Address,

        /// Why the binding failed.
        reason: String,
    },

    /// The transaction was rejected before inclusion, e.g. by the mempool.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The transaction was included but reverted.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// The client could not reach the chain.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result of a call on the rollup contract.
pub type ContractResult<T> = Result<T, ContractErr>;

/// Unified error type for everything that can go wrong synchronously in the reactor.
#[derive(Debug, Error)]
pub enum ReactorErr {
    /// Errors related to binding the rollup contract for a new staker.
    #[error("staker setup failed: {0}")]
    ContractBinding(#[from] ContractErr),

    /// The address is already controlled by a local staker.
    #[error("staker {0} is already registered")]
    DuplicateStaker(Address),

    /// The reactor task is no longer running.
    #[error("reactor service stopped")]
    ServiceStopped,
}

/// Error type for shutdown operations.
#[derive(Debug, Error)]
pub enum ShutdownErr {
    /// Some submissions were still in flight when the timeout elapsed.
    #[error("timeout during shutdown with {0} submissions still in flight")]
    ShutdownTimeout(usize),

    /// The reactor task ended before acknowledging the shutdown.
    #[error("reactor service stopped before shutdown completed")]
    ServiceStopped,
}
