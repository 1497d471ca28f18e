//! Errors for the rollup validator primitives.

use thiserror::Error;

/// Error while parsing a fixed-size buffer from its hex representation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseBufErr {
    /// The input is not valid hex or does not have the expected length.
    #[error("invalid hex buffer: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
