//! Arguments of the administrative contract calls: pruning leaves and recovering stakes.

use serde::{Deserialize, Serialize};

use crate::{
    buf::{Address, Buf32},
    node::PathProof,
};

/// Arguments to prune a leaf that no longer descends from the latest confirmed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneParams {
    /// The leaf being pruned.
    pub leaf_hash: Buf32,

    /// Ancestor at which the leaf's branch diverges from the confirmed chain.
    pub ancestor_hash: Buf32,

    /// Proof from the ancestor to the leaf.
    pub leaf_proof: PathProof,

    /// Proof from the ancestor to the latest confirmed node.
    pub anc_proof: PathProof,
}

/// Arguments to refund a stake placed on a branch that can no longer be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverStakeMootedParams {
    /// Ancestor at which the staker's branch diverges from the confirmed chain.
    pub ancestor_hash: Buf32,

    /// Staker whose stake is refunded.
    pub addr: Address,

    /// Proof from the ancestor to the latest confirmed node.
    pub lc_proof: PathProof,

    /// Proof from the ancestor to the staker's position.
    pub st_proof: PathProof,
}

/// Arguments to refund a stake placed on a node that has been confirmed long enough ago.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverStakeOldParams {
    /// Staker whose stake is refunded.
    pub addr: Address,

    /// Proof from the staker's position to the latest confirmed node.
    pub proof: PathProof,
}
