//! Types describing positions in the dispute graph as seen by the validator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buf::{Address, Buf32};

/// The reason a child node conflicts with its siblings.
///
/// This selects which challenge sub-protocol applies when the node is disputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// The node claims an invalid top of the pending inbox.
    PendingTop,

    /// The node claims an invalid set of imported messages.
    Messages,

    /// The node claims an invalid execution of the machine.
    Execution,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkType::PendingTop => "pending-top",
            LinkType::Messages => "messages",
            LinkType::Execution => "execution",
        };
        f.write_str(s)
    }
}

/// Inclusive range of blocks within which an assertion claims to have executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    /// First block of the range.
    pub start_block: u64,

    /// Last block of the range.
    pub end_block: u64,
}

/// A node of the dispute graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Hash identifying the node.
    pub hash: Buf32,

    /// Hash of the parent node, [`None`] for the root.
    pub prev_hash: Option<Buf32>,

    /// Which sub-challenge applies if this node is challenged.
    pub link_type: LinkType,

    /// Hash of the machine state the node's assertion starts from.
    pub machine_hash: Buf32,

    /// Number of machine steps claimed by the node's assertion.
    pub num_steps: u64,

    /// Deadline after which the node may be confirmed, in ticks.
    pub deadline_ticks: u64,
}

/// Snapshot of the pending inbox handed to the inbox sub-challenges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInbox {
    /// Accumulated hash of the inbox top.
    pub top_hash: Buf32,

    /// Number of messages in the inbox.
    pub count: u64,
}

/// Precondition of a disputed execution, derived by the graph from the disputed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPrecondition {
    /// Machine hash before execution.
    pub before_hash: Buf32,

    /// Blocks within which the execution took place.
    pub time_bounds: TimeBounds,

    /// Inbox hash before execution.
    pub before_inbox: Buf32,
}

/// Where a staker currently sits in the dispute graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerPosition {
    /// The staker's address.
    pub address: Address,

    /// Hash of the node the staker is staked on.
    pub location: Buf32,

    /// Block in which the stake was created.
    pub creation_block: u64,

    /// Challenge the staker is currently engaged in, if any.
    pub challenge: Option<Address>,
}

/// Ancestry proof between two nodes of the dispute graph.
///
/// An empty proof is valid and means both ends are the same node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathProof(pub Vec<Buf32>);

impl From<Vec<Buf32>> for PathProof {
    fn from(value: Vec<Buf32>) -> Self {
        Self(value)
    }
}
