//! Events emitted by the rollup contract and its challenge contracts.
//!
//! Beyond the addresses and hashes that identify who and what an event is about, the payloads are
//! passed through to the contract calls untouched.

use serde::{Deserialize, Serialize};

use crate::{
    buf::{Address, Buf32},
    node::{LinkType, TimeBounds},
};

/// Where on the settlement chain an event was observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Hash of the block containing the event.
    pub block_hash: Buf32,

    /// Height of the block containing the event.
    pub block_height: u64,

    /// Index of the log within the block.
    pub log_index: u64,
}

/// A staker placed a new stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeCreatedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// The staker.
    pub staker: Address,

    /// Node the stake was placed on.
    pub node_hash: Buf32,
}

/// A staker's stake was refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRefundedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// The staker.
    pub staker: Address,
}

/// A staker moved its stake further down its branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeMovedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// The staker.
    pub staker: Address,

    /// The node the stake now sits on.
    pub location: Buf32,
}

/// A challenge contract was created between two stakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeStartedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// Staker defending its branch.
    pub asserter: Address,

    /// Staker disputing the asserter's branch.
    pub challenger: Address,

    /// Sub-protocol the challenge runs.
    pub challenge_type: LinkType,

    /// Address of the newly deployed challenge contract.
    pub challenge_contract: Address,
}

/// A challenge contract resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeCompletedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// Staker that won the challenge.
    pub winner: Address,

    /// Staker that lost the challenge and its stake.
    pub loser: Address,

    /// Address of the resolved challenge contract.
    pub challenge_contract: Address,
}

/// A staker made an assertion, creating a set of new leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// Leaf the assertion was made on.
    pub prev_leaf_hash: Buf32,

    /// Blocks within which the asserted execution took place.
    pub time_bounds: TimeBounds,

    /// Claimed inbox top after the assertion.
    pub after_inbox_top: Buf32,

    /// Number of machine steps claimed.
    pub num_steps: u64,

    /// Number of inbox messages imported.
    pub imported_message_count: u64,

    /// Machine hash claimed after execution.
    pub after_machine_hash: Buf32,
}

/// A node was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// The confirmed node.
    pub node_hash: Buf32,
}

/// A leaf was pruned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunedEvent {
    /// Where the event was observed.
    pub chain_info: ChainInfo,

    /// The pruned leaf.
    pub leaf: Buf32,
}
