use serde::{Deserialize, Serialize};

use crate::buf::Address;

/// The identity on whose behalf contract calls are signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Address every call is sent from.
    pub from: Address,
}

impl Authority {
    /// Creates an authority sending from `from`.
    pub const fn new(from: Address) -> Self {
        Self { from }
    }
}
