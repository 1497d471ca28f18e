//! The boundary between the reactor and the collaborators it drives or consults: the dispute graph,
//! the path prover and the ledger client.

use async_trait::async_trait;
use rollup_validator_primitives::{
    buf::{Address, Buf32},
    node::{ExecutionPrecondition, Node, PathProof, PendingInbox, StakerPosition},
    opportunity::{
        ChallengeOpportunity, ConfirmInvalidOpportunity, ConfirmValidOpportunity,
        PreparedAssertion,
    },
    params::{PruneParams, RecoverStakeMootedParams, RecoverStakeOldParams},
    types::Authority,
};

use crate::errors::ContractResult;

/// Read access to the dispute graph maintained by the chain observer.
///
/// Implementations are shared with the observer that mutates the graph, so every method takes
/// `&self` and must be cheap enough to call from the reactor's event path.
pub trait DisputeGraph: Send + Sync {
    /// Hash of the latest confirmed node.
    fn latest_confirmed(&self) -> Buf32;

    /// Hash of the latest node the local machine knows to be valid.
    ///
    /// This is where newly registered local stakers place their stake.
    fn known_valid_node(&self) -> Buf32;

    /// Amount that must be bonded to place a stake.
    fn stake_requirement(&self) -> u128;

    /// The node at `hash`, if the graph contains it.
    fn node_from_hash(&self, hash: &Buf32) -> Option<Node>;

    /// The leaf reached by following the valid branch down from `position`.
    fn leaf_for(&self, position: &Buf32) -> Node;

    /// Where `staker` is currently staked, if it has a stake.
    fn position_of(&self, staker: &Address) -> Option<StakerPosition>;

    /// Every pair of stakers in the graph that can currently be challenged.
    fn challenge_opportunity_all_pairs(&self) -> Vec<ChallengeOpportunity>;

    /// A challenge between `a` and `b`, if their positions conflict.
    fn challenge_opportunity_pair(
        &self,
        a: &StakerPosition,
        b: &StakerPosition,
    ) -> Option<ChallengeOpportunity>;

    /// A challenge between `staker` and any other staker, if one exists.
    fn challenge_opportunity_any(&self, staker: &StakerPosition) -> Option<ChallengeOpportunity>;

    /// The current pending inbox.
    fn pending_inbox(&self) -> PendingInbox;

    /// The precondition of the execution asserted by `node`.
    fn execution_precondition(&self, node: &Node) -> ExecutionPrecondition;
}

/// Builds ancestry proofs between nodes of the dispute graph.
pub trait PathProver: Send + Sync {
    /// A proof that `to` descends from `from`, or [`None`] if it does not.
    fn path_proof(&self, from: &Buf32, to: &Buf32) -> Option<PathProof>;
}

/// The rollup contract and its challenge contracts, bound to a single signing authority.
///
/// Every method submits one transaction and resolves once the outcome is known. Calls made through
/// the same binding must not race each other, which is why the reactor only ever reaches a binding
/// through its [`StakerAgent`](crate::staker_agent::StakerAgent).
#[async_trait]
pub trait RollupContract: Send + Sync + 'static {
    /// Bonds `amount` on the node at the end of `proof2`.
    async fn place_stake(
        &self,
        amount: u128,
        proof1: PathProof,
        proof2: PathProof,
    ) -> ContractResult<()>;

    /// Opens a challenge against the opportunity's asserter.
    async fn start_challenge(&self, opportunity: ChallengeOpportunity) -> ContractResult<()>;

    /// Defends a node accused of claiming a wrong pending inbox top.
    async fn defend_pending_top(
        &self,
        challenge: Address,
        inbox: PendingInbox,
        node: Node,
    ) -> ContractResult<()>;

    /// Defends a node accused of importing the wrong messages.
    async fn defend_messages(
        &self,
        challenge: Address,
        inbox: PendingInbox,
        node: Node,
    ) -> ContractResult<()>;

    /// Defends a node accused of a wrong execution.
    async fn defend_execution(
        &self,
        challenge: Address,
        machine: Buf32,
        precondition: ExecutionPrecondition,
        num_steps: u64,
    ) -> ContractResult<()>;

    /// Pursues a pending inbox top challenge.
    async fn challenge_pending_top(
        &self,
        challenge: Address,
        inbox: PendingInbox,
    ) -> ContractResult<()>;

    /// Pursues an imported messages challenge.
    async fn challenge_messages(
        &self,
        challenge: Address,
        inbox: PendingInbox,
        node: Node,
    ) -> ContractResult<()>;

    /// Pursues an execution challenge.
    async fn challenge_execution(
        &self,
        challenge: Address,
        machine: Buf32,
        precondition: ExecutionPrecondition,
    ) -> ContractResult<()>;

    /// Makes an assertion on top of the prepared leaf.
    async fn make_assertion(
        &self,
        prepared: PreparedAssertion,
        proof: PathProof,
    ) -> ContractResult<()>;

    /// Confirms a valid node.
    async fn confirm_valid(&self, params: ConfirmValidOpportunity) -> ContractResult<()>;

    /// Confirms the rejection of an invalid node.
    async fn confirm_invalid(&self, params: ConfirmInvalidOpportunity) -> ContractResult<()>;

    /// Prunes a dead leaf.
    async fn prune_leaf(&self, params: PruneParams) -> ContractResult<()>;

    /// Refunds a stake on a dead branch.
    async fn recover_stake_mooted(&self, params: RecoverStakeMootedParams) -> ContractResult<()>;

    /// Refunds a stake on a long-confirmed node.
    async fn recover_stake_old(&self, params: RecoverStakeOldParams) -> ContractResult<()>;
}

/// A connection to the settlement chain able to produce contract bindings.
pub trait LedgerClient {
    /// The binding produced by this client.
    type Contract: RollupContract;

    /// Binds the rollup contract at `rollup` so that calls are signed by `authority`.
    fn bind_rollup(&self, rollup: Address, authority: &Authority) -> ContractResult<Self::Contract>;
}
