//! Write-once record of the broadcast actions already submitted.

use std::collections::BTreeSet;

use rollup_validator_primitives::buf::Buf32;

/// A monotonically growing set of node or leaf hashes whose action has been submitted.
///
/// Hashes are never removed. Once marked, the corresponding action is not submitted again for the
/// lifetime of the set.
#[derive(Debug, Clone, Default)]
pub struct SentSet {
    sent: BTreeSet<Buf32>,
}

impl SentSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self {
            sent: BTreeSet::new(),
        }
    }

    /// Whether the action for `hash` has already been submitted.
    pub fn contains(&self, hash: &Buf32) -> bool {
        self.sent.contains(hash)
    }

    /// Marks the action for `hash` as submitted.
    ///
    /// Returns `false` if it was already marked.
    pub fn mark_sent(&mut self, hash: Buf32) -> bool {
        self.sent.insert(hash)
    }
}
