//! The closed set of inputs the reactor reacts to.

use rollup_validator_primitives::{
    buf::Buf32,
    events::{
        AssertedEvent, ChallengeCompletedEvent, ChallengeStartedEvent, ConfirmedEvent,
        PrunedEvent, StakeCreatedEvent, StakeMovedEvent, StakeRefundedEvent,
    },
    node::Node,
    opportunity::{ConfirmInvalidOpportunity, ConfirmValidOpportunity, PreparedAssertion},
    params::{PruneParams, RecoverStakeMootedParams, RecoverStakeOldParams},
};

/// Everything the [`ProtocolReactor`](crate::reactor::ProtocolReactor) reacts to.
///
/// The first group are rollup contract events as delivered by the chain observer. The second group
/// are opportunities found by polling the dispute graph; those may be delivered repeatedly for the
/// same node or leaf.
#[derive(Debug, Clone)]
pub enum ReactorEvent {
    /// A staker placed a stake.
    StakeCreated(StakeCreatedEvent),

    /// A staker's stake was refunded.
    StakeRemoved(StakeRefundedEvent),

    /// A staker moved its stake.
    StakeMoved(StakeMovedEvent),

    /// A challenge was opened.
    ChallengeStarted {
        /// The contract event.
        event: ChallengeStartedEvent,

        /// The asserter's node being disputed.
        conflict_node: Node,
    },

    /// A challenge resolved.
    ChallengeCompleted(ChallengeCompletedEvent),

    /// An assertion was made.
    SawAssertion(AssertedEvent),

    /// A node was confirmed.
    ConfirmedNode(ConfirmedEvent),

    /// A leaf was pruned.
    PrunedLeaf(PrunedEvent),

    /// An assertion was computed locally and can be made.
    AssertionPrepared(PreparedAssertion),

    /// A valid node can be confirmed.
    ValidNodeConfirmable(ConfirmValidOpportunity),

    /// An invalid node can be rejected.
    InvalidNodeConfirmable(ConfirmInvalidOpportunity),

    /// Leaves that can be pruned.
    PrunableLeafs(Vec<PruneParams>),

    /// Stakes on dead branches that can be refunded.
    MootableStakes(Vec<RecoverStakeMootedParams>),

    /// Stakes on long-confirmed nodes that can be refunded.
    OldStakes(Vec<RecoverStakeOldParams>),

    /// The latest node known to be valid advanced.
    AdvancedKnownValidNode(Buf32),

    /// The local machine finished computing an assertion on top of a node.
    AdvancedKnownAssertion {
        /// Hash of the computed assertion.
        assertion_hash: Buf32,

        /// The node the assertion builds on.
        node_hash: Buf32,
    },
}
