//! Opportunities detected by the dispute graph that a local staker may act upon.

use serde::{Deserialize, Serialize};

use crate::{
    buf::{Address, Buf32},
    node::{LinkType, PathProof, TimeBounds},
};

/// Two conflicting staker positions that are eligible for a challenge to be opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeOpportunity {
    /// Staker whose branch is being disputed.
    pub asserter: Address,

    /// Staker opening the challenge.
    pub challenger: Address,

    /// Common ancestor of both conflicting branches.
    pub prev_node_hash: Buf32,

    /// Deadline of the conflicting children, in ticks.
    pub deadline_ticks: u64,

    /// Link type of the asserter's child of the common ancestor.
    pub asserter_link_type: LinkType,

    /// Link type of the challenger's child of the common ancestor.
    pub challenger_link_type: LinkType,

    /// Protocol state hash claimed by the asserter's branch.
    pub asserter_vm_proto_hash: Buf32,

    /// Protocol state hash claimed by the challenger's branch.
    pub challenger_vm_proto_hash: Buf32,

    /// Proof from the conflicting child to the asserter's position.
    pub asserter_proof: PathProof,

    /// Proof from the conflicting child to the challenger's position.
    pub challenger_proof: PathProof,

    /// Hash of the asserter's conflicting child.
    pub asserter_node_hash: Buf32,

    /// Data hash committing to the challenger's conflicting child.
    pub challenger_data_hash: Buf32,

    /// Length of the challenge period, in ticks.
    pub challenger_period_ticks: u64,
}

/// Parameters of the assertion the local machine would make on top of a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionParams {
    /// Number of machine steps executed.
    pub num_steps: u64,

    /// Blocks within which the execution took place.
    pub time_bounds: TimeBounds,

    /// Number of inbox messages imported.
    pub imported_message_count: u64,
}

/// An assertion computed locally and ready to be made on top of `leaf_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedAssertion {
    /// The leaf the assertion builds on.
    pub leaf_hash: Buf32,

    /// Parent of the leaf.
    pub prev_prev_leaf_hash: Buf32,

    /// Data hash committing to the leaf.
    pub prev_data_hash: Buf32,

    /// Deadline of the leaf, in ticks.
    pub prev_deadline_ticks: u64,

    /// Link type of the leaf relative to its parent.
    pub prev_link_type: LinkType,

    /// Machine hash before the assertion.
    pub before_hash: Buf32,

    /// Inbox hash before the assertion.
    pub before_inbox: Buf32,

    /// Execution parameters.
    pub params: AssertionParams,

    /// Machine hash after the assertion.
    pub after_hash: Buf32,

    /// Accumulator of the outgoing messages.
    pub messages_acc: Buf32,

    /// Accumulator of the emitted logs.
    pub logs_acc: Buf32,
}

/// A valid node whose deadline has passed and that can now be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmValidOpportunity {
    /// Node being confirmed.
    pub node_hash: Buf32,

    /// Deadline of the node, in ticks.
    pub deadline_ticks: u64,

    /// Outgoing messages emitted by the node.
    pub messages: Vec<Vec<u8>>,

    /// Accumulator of the emitted logs.
    pub logs_acc: Buf32,

    /// Protocol state hash after the node.
    pub vm_proto_state_hash: Buf32,

    /// Stakers proving they are staked on or after the node.
    pub staker_addresses: Vec<Address>,

    /// Concatenated path proofs for every staker.
    pub staker_proofs: Vec<Buf32>,

    /// Offsets of each staker's proof within `staker_proofs`.
    pub staker_proof_offsets: Vec<u64>,
}

/// An invalid node whose deadline has passed and whose rejection can now be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmInvalidOpportunity {
    /// Node being rejected.
    pub node_hash: Buf32,

    /// Deadline of the node, in ticks.
    pub deadline_ticks: u64,

    /// Data hash committing to the rejected node.
    pub challenge_node_data: Buf32,

    /// Branch the node was created on.
    pub branch: LinkType,

    /// Protocol state hash of the node.
    pub vm_proto_state_hash: Buf32,

    /// Stakers proving they are staked on or after the node.
    pub staker_addresses: Vec<Address>,

    /// Concatenated path proofs for every staker.
    pub staker_proofs: Vec<Buf32>,

    /// Offsets of each staker's proof within `staker_proofs`.
    pub staker_proof_offsets: Vec<u64>,
}
