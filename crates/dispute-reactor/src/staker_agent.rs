//! Per-staker submission unit.
//!
//! A [`StakerAgent`] owns the contract binding of one locally controlled staker. The binding sits
//! behind an async mutex, so at most one submission per staker is ever in flight and the order in
//! which that staker's transactions reach the chain cannot interleave.

use std::{fmt, sync::Arc};

use rollup_validator_primitives::{
    buf::{Address, Buf32},
    node::{ExecutionPrecondition, Node, PathProof, PendingInbox},
    opportunity::{
        ChallengeOpportunity, ConfirmInvalidOpportunity, ConfirmValidOpportunity,
        PreparedAssertion,
    },
    params::{PruneParams, RecoverStakeMootedParams, RecoverStakeOldParams},
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::{errors::ContractResult, interfaces::RollupContract};

/// Handle to one local staker.
///
/// Cloning is cheap and every clone shares the same gate.
pub struct StakerAgent<C> {
    address: Address,
    contract: Arc<Mutex<C>>,
}

impl<C> Clone for StakerAgent<C> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            contract: self.contract.clone(),
        }
    }
}

impl<C> fmt::Debug for StakerAgent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StakerAgent")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl<C: RollupContract> StakerAgent<C> {
    /// Creates an agent for the staker at `address` submitting through `contract`.
    pub fn new(address: Address, contract: C) -> Self {
        Self {
            address,
            contract: Arc::new(Mutex::new(contract)),
        }
    }

    /// The staker's address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Waits for this staker's previous submission to finish.
    ///
    /// The gate is released when the returned guard is dropped, which also happens when the
    /// submitting future fails or is cancelled.
    async fn gate(&self) -> MutexGuard<'_, C> {
        let guard = self.contract.lock().await;
        trace!(staker = %self.address, "acquired submission gate");
        guard
    }

    /// Places this staker's stake on the node at the end of `proof2`.
    pub async fn place_stake(
        &self,
        amount: u128,
        proof1: PathProof,
        proof2: PathProof,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, %amount, "placing stake");
        contract.place_stake(amount, proof1, proof2).await
    }

    /// Opens the challenge described by `opportunity`.
    pub async fn initiate_challenge(&self, opportunity: ChallengeOpportunity) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(
            staker = %self.address,
            asserter = %opportunity.asserter,
            challenger = %opportunity.challenger,
            "initiating challenge"
        );
        contract.start_challenge(opportunity).await
    }

    /// Defends `node` in a pending inbox top challenge.
    pub async fn defend_pending_top(
        &self,
        challenge: Address,
        inbox: PendingInbox,
        node: Node,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, %challenge, node = %node.hash, "defending pending top");
        contract.defend_pending_top(challenge, inbox, node).await
    }

    /// Defends `node` in an imported messages challenge.
    pub async fn defend_messages(
        &self,
        challenge: Address,
        inbox: PendingInbox,
        node: Node,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, %challenge, node = %node.hash, "defending messages");
        contract.defend_messages(challenge, inbox, node).await
    }

    /// Defends an execution of `num_steps` steps of `machine` in an execution challenge.
    pub async fn defend_execution(
        &self,
        challenge: Address,
        machine: Buf32,
        precondition: ExecutionPrecondition,
        num_steps: u64,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, %challenge, %num_steps, "defending execution");
        contract
            .defend_execution(challenge, machine, precondition, num_steps)
            .await
    }

    /// Pursues a pending inbox top challenge.
    pub async fn challenge_pending_top(
        &self,
        challenge: Address,
        inbox: PendingInbox,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, %challenge, "challenging pending top");
        contract.challenge_pending_top(challenge, inbox).await
    }

    /// Pursues an imported messages challenge against `node`.
    pub async fn challenge_messages(
        &self,
        challenge: Address,
        inbox: PendingInbox,
        node: Node,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, %challenge, node = %node.hash, "challenging messages");
        contract.challenge_messages(challenge, inbox, node).await
    }

    /// Pursues an execution challenge.
    pub async fn challenge_execution(
        &self,
        challenge: Address,
        machine: Buf32,
        precondition: ExecutionPrecondition,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, %challenge, "challenging execution");
        contract
            .challenge_execution(challenge, machine, precondition)
            .await
    }

    /// Makes the prepared assertion, proving this staker sits on the leaf's branch.
    pub async fn make_assertion(
        &self,
        prepared: PreparedAssertion,
        proof: PathProof,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, leaf = %prepared.leaf_hash, "making assertion");
        contract.make_assertion(prepared, proof).await
    }

    /// Confirms a valid node.
    pub async fn confirm_valid(&self, params: ConfirmValidOpportunity) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, node = %params.node_hash, "confirming valid node");
        contract.confirm_valid(params).await
    }

    /// Confirms the rejection of an invalid node.
    pub async fn confirm_invalid(&self, params: ConfirmInvalidOpportunity) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, node = %params.node_hash, "confirming invalid node");
        contract.confirm_invalid(params).await
    }

    /// Prunes a dead leaf.
    pub async fn prune_leaf(&self, params: PruneParams) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, leaf = %params.leaf_hash, "pruning leaf");
        contract.prune_leaf(params).await
    }

    /// Refunds a stake on a dead branch.
    pub async fn recover_stake_mooted(
        &self,
        params: RecoverStakeMootedParams,
    ) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, mooted = %params.addr, "recovering mooted stake");
        contract.recover_stake_mooted(params).await
    }

    /// Refunds a stake on a long-confirmed node.
    pub async fn recover_stake_old(&self, params: RecoverStakeOldParams) -> ContractResult<()> {
        let contract = self.gate().await;
        debug!(staker = %self.address, old = %params.addr, "recovering old stake");
        contract.recover_stake_old(params).await
    }
}
