//! This module implements the [`ProtocolReactor`]. It is responsible for turning rollup contract
//! events and dispute graph opportunities into submissions by the locally controlled stakers,
//! according to the rollup dispute protocol rules.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use rollup_validator_primitives::{
    buf::Address,
    events::{
        ChallengeCompletedEvent, ChallengeStartedEvent, StakeCreatedEvent, StakeMovedEvent,
    },
    node::{LinkType, Node},
    opportunity::{ConfirmInvalidOpportunity, ConfirmValidOpportunity, PreparedAssertion},
    params::{PruneParams, RecoverStakeMootedParams, RecoverStakeOldParams},
    types::Authority,
};
use tracing::{debug, info, trace, warn};

use crate::{
    config::ReactorConfig,
    dedup::SentSet,
    errors::{ReactorErr, ShutdownErr},
    events::ReactorEvent,
    interfaces::{DisputeGraph, LedgerClient, PathProver, RollupContract},
    staker_agent::StakerAgent,
    submissions::{SubmissionKind, SubmissionTracker},
};

/// Decides which local staker acts on each event and dispatches the action.
///
/// Events are handled one at a time through `&mut self`, and no handler ever awaits: every
/// contract call runs on a detached task that only holds a clone of the acting
/// [`StakerAgent`]. This is what allows the broadcast sets to be plain values.
///
/// Actions that change shared on-chain state (assertions, confirmations, pruning, stake recovery)
/// are submitted by a single local staker, while challenge actions fan out to every local staker
/// involved.
#[derive(Debug)]
pub struct ProtocolReactor<G, P, C> {
    config: ReactorConfig,

    graph: Arc<G>,

    prover: P,

    /// Local stakers, enumerated in ascending address order.
    stakers: BTreeMap<Address, StakerAgent<C>>,

    broadcast_assertions: SentSet,

    broadcast_confirmations: SentSet,

    broadcast_leaf_prunes: SentSet,

    submissions: SubmissionTracker,
}

impl<G, P, C> ProtocolReactor<G, P, C>
where
    G: DisputeGraph,
    P: PathProver,
    C: RollupContract,
{
    /// Creates a reactor with no local stakers.
    pub fn new(config: ReactorConfig, graph: Arc<G>, prover: P) -> Self {
        let submissions = SubmissionTracker::new(config.max_tracked_submissions);
        Self {
            config,
            graph,
            prover,
            stakers: BTreeMap::new(),
            broadcast_assertions: SentSet::new(),
            broadcast_confirmations: SentSet::new(),
            broadcast_leaf_prunes: SentSet::new(),
            submissions,
        }
    }

    /// Registers a local staker and places its stake on the latest known valid node.
    ///
    /// Fails only if the contract binding cannot be constructed. The stake submission runs
    /// detached and its failure is only logged. If the stake location cannot be proven from the
    /// latest confirmed node, the staker is still registered but no stake is placed.
    pub fn add_staker<L>(&mut self, client: &L, authority: Authority) -> Result<Address, ReactorErr>
    where
        L: LedgerClient<Contract = C>,
    {
        let address = authority.from;
        if self.stakers.contains_key(&address) {
            return Err(ReactorErr::DuplicateStaker(address));
        }

        let contract = client.bind_rollup(self.config.rollup_address, &authority)?;
        let agent = StakerAgent::new(address, contract);
        self.stakers.insert(address, agent.clone());

        let confirmed = self.graph.latest_confirmed();
        let location = self.graph.known_valid_node();
        let leaf = self.graph.leaf_for(&location).hash;
        info!(staker = %address, %location, "registered local staker");

        let proofs = (
            self.prover.path_proof(&confirmed, &location),
            self.prover.path_proof(&location, &leaf),
        );
        let (Some(proof1), Some(proof2)) = proofs else {
            warn!(
                staker = %address,
                %location,
                %leaf,
                "stake location is unprovable, not placing stake"
            );
            return Ok(address);
        };
        let amount = self.graph.stake_requirement();

        self.submissions
            .spawn(SubmissionKind::PlaceStake, address, async move {
                agent.place_stake(amount, proof1, proof2).await
            });

        Ok(address)
    }

    /// Whether `address` is controlled locally.
    pub fn is_local(&self, address: &Address) -> bool {
        self.stakers.contains_key(address)
    }

    /// Addresses of the local stakers, in the order they are enumerated.
    pub fn local_stakers(&self) -> impl Iterator<Item = &Address> {
        self.stakers.keys()
    }

    /// Number of submissions still running, as far as the diagnostics record knows.
    pub fn in_flight_submissions(&mut self) -> usize {
        self.submissions.in_flight()
    }

    /// Waits up to `wait` for every tracked submission to finish.
    pub async fn drain_submissions(&mut self, wait: Duration) -> Result<(), ShutdownErr> {
        self.submissions.drain(wait).await
    }

    /// Waits for in-flight submissions for at most the configured shutdown timeout.
    pub async fn shutdown(&mut self) -> Result<(), ShutdownErr> {
        info!("initiating shutdown - waiting for in-flight submissions");
        self.drain_submissions(self.config.shutdown_timeout).await?;
        info!("shutdown - all submissions settled");
        Ok(())
    }

    /// Reacts to a single event.
    pub fn handle_event(&mut self, event: ReactorEvent) {
        match event {
            ReactorEvent::StakeCreated(ev) => self.stake_created(ev),
            ReactorEvent::StakeRemoved(ev) => {
                // The local registry is kept even if the stake is gone.
                trace!(staker = %ev.staker, "stake removed");
            }
            ReactorEvent::StakeMoved(ev) => self.stake_moved(ev),
            ReactorEvent::ChallengeStarted {
                event,
                conflict_node,
            } => self.started_challenge(event, conflict_node),
            ReactorEvent::ChallengeCompleted(ev) => self.completed_challenge(ev),
            ReactorEvent::SawAssertion(ev) => {
                trace!(prev_leaf = %ev.prev_leaf_hash, num_steps = %ev.num_steps, "saw assertion");
            }
            ReactorEvent::ConfirmedNode(ev) => trace!(node = %ev.node_hash, "node confirmed"),
            ReactorEvent::PrunedLeaf(ev) => trace!(leaf = %ev.leaf, "leaf pruned"),
            ReactorEvent::AssertionPrepared(prepared) => self.assertion_prepared(prepared),
            ReactorEvent::ValidNodeConfirmable(conf) => self.valid_node_confirmable(conf),
            ReactorEvent::InvalidNodeConfirmable(conf) => self.invalid_node_confirmable(conf),
            ReactorEvent::PrunableLeafs(params) => self.prunable_leafs(params),
            ReactorEvent::MootableStakes(params) => self.mootable_stakes(params),
            ReactorEvent::OldStakes(params) => self.old_stakes(params),
            ReactorEvent::AdvancedKnownValidNode(node) => {
                trace!(%node, "advanced known valid node");
            }
            ReactorEvent::AdvancedKnownAssertion {
                assertion_hash,
                node_hash,
            } => trace!(%assertion_hash, node = %node_hash, "advanced known assertion"),
        }
    }

    fn stake_created(&mut self, ev: StakeCreatedEvent) {
        let Some(staker) = self.stakers.get(&ev.staker) else {
            self.challenge_staker_if_possible(ev.staker);
            return;
        };

        let opportunities = self.graph.challenge_opportunity_all_pairs();
        info!(
            staker = %ev.staker,
            count = opportunities.len(),
            "local stake created, initiating challenges"
        );

        for opportunity in opportunities {
            let agent = staker.clone();
            self.submissions
                .spawn(SubmissionKind::InitiateChallenge, ev.staker, async move {
                    agent.initiate_challenge(opportunity).await
                });
        }
    }

    fn stake_moved(&mut self, ev: StakeMovedEvent) {
        debug!(staker = %ev.staker, location = %ev.location, "stake moved");
        self.challenge_staker_if_possible(ev.staker);
    }

    /// Opens at most one challenge against the foreign staker at `target`.
    ///
    /// Each local staker in turn is first checked for a direct conflict with the target; failing
    /// that, the target is checked for a conflict with anyone, and the current local staker opens
    /// it.
    fn challenge_staker_if_possible(&mut self, target: Address) {
        if self.stakers.contains_key(&target) {
            return;
        }

        let Some(target_position) = self.graph.position_of(&target) else {
            debug!(staker = %target, "staker has no position, nothing to challenge");
            return;
        };

        for (my_addr, agent) in &self.stakers {
            let opportunity = self
                .graph
                .position_of(my_addr)
                .and_then(|me| self.graph.challenge_opportunity_pair(&target_position, &me))
                .or_else(|| self.graph.challenge_opportunity_any(&target_position));

            if let Some(opportunity) = opportunity {
                info!(staker = %my_addr, %target, "challenging staker");
                let agent = agent.clone();
                self.submissions
                    .spawn(SubmissionKind::InitiateChallenge, *my_addr, async move {
                        agent.initiate_challenge(opportunity).await
                    });
                return;
            }
        }

        debug!(staker = %target, "no challenge opportunity against staker");
    }

    fn started_challenge(&mut self, ev: ChallengeStartedEvent, conflict_node: Node) {
        let challenge = ev.challenge_contract;

        if let Some(asserter) = self.stakers.get(&ev.asserter) {
            let agent = asserter.clone();
            info!(
                staker = %ev.asserter,
                %challenge,
                link_type = %conflict_node.link_type,
                "defending challenged node"
            );
            match conflict_node.link_type {
                LinkType::PendingTop => {
                    let inbox = self.graph.pending_inbox();
                    let node = conflict_node.clone();
                    self.submissions
                        .spawn(SubmissionKind::DefendPendingTop, ev.asserter, async move {
                            agent.defend_pending_top(challenge, inbox, node).await
                        });
                }
                LinkType::Messages => {
                    let inbox = self.graph.pending_inbox();
                    let node = conflict_node.clone();
                    self.submissions
                        .spawn(SubmissionKind::DefendMessages, ev.asserter, async move {
                            agent.defend_messages(challenge, inbox, node).await
                        });
                }
                LinkType::Execution => {
                    let machine = conflict_node.machine_hash;
                    let precondition = self.graph.execution_precondition(&conflict_node);
                    let num_steps = conflict_node.num_steps;
                    self.submissions
                        .spawn(SubmissionKind::DefendExecution, ev.asserter, async move {
                            agent
                                .defend_execution(challenge, machine, precondition, num_steps)
                                .await
                        });
                }
            }
        }

        if let Some(challenger) = self.stakers.get(&ev.challenger) {
            let agent = challenger.clone();
            info!(
                staker = %ev.challenger,
                %challenge,
                link_type = %conflict_node.link_type,
                "pursuing challenge"
            );
            match conflict_node.link_type {
                LinkType::PendingTop => {
                    let inbox = self.graph.pending_inbox();
                    self.submissions.spawn(
                        SubmissionKind::ChallengePendingTop,
                        ev.challenger,
                        async move { agent.challenge_pending_top(challenge, inbox).await },
                    );
                }
                LinkType::Messages => {
                    let inbox = self.graph.pending_inbox();
                    self.submissions.spawn(
                        SubmissionKind::ChallengeMessages,
                        ev.challenger,
                        async move {
                            agent
                                .challenge_messages(challenge, inbox, conflict_node)
                                .await
                        },
                    );
                }
                LinkType::Execution => {
                    let machine = conflict_node.machine_hash;
                    let precondition = self.graph.execution_precondition(&conflict_node);
                    self.submissions.spawn(
                        SubmissionKind::ChallengeExecution,
                        ev.challenger,
                        async move {
                            agent
                                .challenge_execution(challenge, machine, precondition)
                                .await
                        },
                    );
                }
            }
        }
    }

    fn completed_challenge(&mut self, ev: ChallengeCompletedEvent) {
        if self.stakers.contains_key(&ev.winner) {
            self.won_challenge(&ev);
        }

        if self.stakers.contains_key(&ev.loser) {
            self.lost_challenge(&ev);
        }

        self.challenge_staker_if_possible(ev.winner);
    }

    fn won_challenge(&self, ev: &ChallengeCompletedEvent) {
        info!(staker = %ev.winner, challenge = %ev.challenge_contract, "won challenge");
    }

    fn lost_challenge(&self, ev: &ChallengeCompletedEvent) {
        info!(staker = %ev.loser, challenge = %ev.challenge_contract, "lost challenge");
    }

    fn assertion_prepared(&mut self, prepared: PreparedAssertion) {
        let leaf_hash = prepared.leaf_hash;
        if self.broadcast_assertions.contains(&leaf_hash) {
            debug!(leaf = %leaf_hash, "assertion already sent");
            return;
        }

        let Some(leaf) = self.graph.node_from_hash(&leaf_hash) else {
            debug!(leaf = %leaf_hash, "prepared assertion builds on an unknown leaf");
            return;
        };

        for (my_addr, agent) in &self.stakers {
            let Some(position) = self.graph.position_of(my_addr) else {
                continue;
            };
            let Some(proof) = self.prover.path_proof(&position.location, &leaf.hash) else {
                continue;
            };

            // Marked before the outcome is known: if this submission fails, the assertion is
            // never retried for this leaf.
            self.broadcast_assertions.mark_sent(leaf_hash);

            info!(staker = %my_addr, leaf = %leaf_hash, "making assertion");
            let agent = agent.clone();
            self.submissions
                .spawn(SubmissionKind::MakeAssertion, *my_addr, async move {
                    agent.make_assertion(prepared, proof).await
                });
            return;
        }

        debug!(leaf = %leaf_hash, "no local staker is on the prepared leaf's branch");
    }

    fn valid_node_confirmable(&mut self, conf: ConfirmValidOpportunity) {
        let node = conf.node_hash;
        if self.broadcast_confirmations.contains(&node) {
            debug!(%node, "confirmation already sent");
            return;
        }

        let Some(agent) = self.stakers.values().next() else {
            debug!(%node, "no local staker to confirm node");
            return;
        };

        self.broadcast_confirmations.mark_sent(node);

        let staker = agent.address();
        info!(%staker, %node, "confirming valid node");
        let agent = agent.clone();
        self.submissions
            .spawn(SubmissionKind::ConfirmValid, staker, async move {
                agent.confirm_valid(conf).await
            });
    }

    fn invalid_node_confirmable(&mut self, conf: ConfirmInvalidOpportunity) {
        let node = conf.node_hash;
        if self.broadcast_confirmations.contains(&node) {
            debug!(%node, "confirmation already sent");
            return;
        }

        let Some(agent) = self.stakers.values().next() else {
            debug!(%node, "no local staker to confirm node");
            return;
        };

        self.broadcast_confirmations.mark_sent(node);

        let staker = agent.address();
        info!(%staker, %node, "confirming invalid node");
        let agent = agent.clone();
        self.submissions
            .spawn(SubmissionKind::ConfirmInvalid, staker, async move {
                agent.confirm_invalid(conf).await
            });
    }

    fn prunable_leafs(&mut self, params: Vec<PruneParams>) {
        let Some(agent) = self.stakers.values().next() else {
            debug!(count = params.len(), "no local staker to prune leaves");
            return;
        };
        let staker = agent.address();

        for prune in params {
            if !self.broadcast_leaf_prunes.mark_sent(prune.leaf_hash) {
                debug!(leaf = %prune.leaf_hash, "prune already sent");
                continue;
            }

            info!(%staker, leaf = %prune.leaf_hash, "pruning leaf");
            let agent = agent.clone();
            self.submissions
                .spawn(SubmissionKind::PruneLeaf, staker, async move {
                    agent.prune_leaf(prune).await
                });
        }
    }

    fn mootable_stakes(&mut self, params: Vec<RecoverStakeMootedParams>) {
        let Some(agent) = self.stakers.values().next() else {
            debug!(count = params.len(), "no local staker to recover mooted stakes");
            return;
        };
        let staker = agent.address();

        for moot in params {
            info!(%staker, mooted = %moot.addr, "recovering mooted stake");
            let agent = agent.clone();
            self.submissions
                .spawn(SubmissionKind::RecoverStakeMooted, staker, async move {
                    agent.recover_stake_mooted(moot).await
                });
        }
    }

    fn old_stakes(&mut self, params: Vec<RecoverStakeOldParams>) {
        let Some(agent) = self.stakers.values().next() else {
            debug!(count = params.len(), "no local staker to recover old stakes");
            return;
        };
        let staker = agent.address();

        for old in params {
            info!(%staker, old = %old.addr, "recovering old stake");
            let agent = agent.clone();
            self.submissions
                .spawn(SubmissionKind::RecoverStakeOld, staker, async move {
                    agent.recover_stake_old(old).await
                });
        }
    }
}
