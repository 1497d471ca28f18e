//! In-memory stand-ins for the dispute graph, the path prover and the ledger client.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use rollup_validator_common::logging::{self, LoggerConfig};
use rollup_validator_primitives::{
    buf::{Address, Buf32},
    node::{
        ExecutionPrecondition, LinkType, Node, PathProof, PendingInbox, StakerPosition, TimeBounds,
    },
    opportunity::{
        AssertionParams, ChallengeOpportunity, ConfirmInvalidOpportunity,
        ConfirmValidOpportunity, PreparedAssertion,
    },
    params::{PruneParams, RecoverStakeMootedParams, RecoverStakeOldParams},
    types::Authority,
};

use crate::{
    config::ReactorConfig,
    errors::{ContractErr, ContractResult},
    interfaces::{DisputeGraph, LedgerClient, PathProver, RollupContract},
    reactor::ProtocolReactor,
};

pub(crate) fn addr(n: u8) -> Address {
    Address([n; 20])
}

pub(crate) fn hash(n: u8) -> Buf32 {
    Buf32([n; 32])
}

/// Hash of the latest confirmed node in the [`MockGraph`].
pub(crate) const CONFIRMED: u8 = 0;

/// Hash of the known valid node in the [`MockGraph`], which is also its own leaf.
pub(crate) const KNOWN_VALID: u8 = 1;

pub(crate) const STAKE_REQUIREMENT: u128 = 1_000;

pub(crate) fn node(n: u8, link_type: LinkType) -> Node {
    Node {
        hash: hash(n),
        prev_hash: Some(hash(CONFIRMED)),
        link_type,
        machine_hash: hash(n.wrapping_add(100)),
        num_steps: 10 * n as u64,
        deadline_ticks: 1_000,
    }
}

pub(crate) fn position(staker: Address, location: u8) -> StakerPosition {
    StakerPosition {
        address: staker,
        location: hash(location),
        creation_block: 1,
        challenge: None,
    }
}

pub(crate) fn opportunity(asserter: Address, challenger: Address) -> ChallengeOpportunity {
    ChallengeOpportunity {
        asserter,
        challenger,
        prev_node_hash: hash(CONFIRMED),
        deadline_ticks: 1_000,
        asserter_link_type: LinkType::Execution,
        challenger_link_type: LinkType::Execution,
        asserter_vm_proto_hash: hash(50),
        challenger_vm_proto_hash: hash(51),
        asserter_proof: PathProof::default(),
        challenger_proof: PathProof::default(),
        asserter_node_hash: hash(52),
        challenger_data_hash: hash(53),
        challenger_period_ticks: 100,
    }
}

pub(crate) fn prepared(leaf: u8) -> PreparedAssertion {
    PreparedAssertion {
        leaf_hash: hash(leaf),
        prev_prev_leaf_hash: hash(CONFIRMED),
        prev_data_hash: hash(60),
        prev_deadline_ticks: 1_000,
        prev_link_type: LinkType::Execution,
        before_hash: hash(61),
        before_inbox: hash(62),
        params: AssertionParams {
            num_steps: 100,
            time_bounds: TimeBounds {
                start_block: 1,
                end_block: 10,
            },
            imported_message_count: 0,
        },
        after_hash: hash(63),
        messages_acc: hash(64),
        logs_acc: hash(65),
    }
}

pub(crate) fn confirm_valid(n: u8) -> ConfirmValidOpportunity {
    ConfirmValidOpportunity {
        node_hash: hash(n),
        deadline_ticks: 1_000,
        messages: vec![vec![n]],
        logs_acc: hash(70),
        vm_proto_state_hash: hash(71),
        staker_addresses: vec![addr(1)],
        staker_proofs: vec![hash(n)],
        staker_proof_offsets: vec![0, 1],
    }
}

pub(crate) fn confirm_invalid(n: u8) -> ConfirmInvalidOpportunity {
    ConfirmInvalidOpportunity {
        node_hash: hash(n),
        deadline_ticks: 1_000,
        challenge_node_data: hash(72),
        branch: LinkType::Messages,
        vm_proto_state_hash: hash(73),
        staker_addresses: vec![addr(1)],
        staker_proofs: vec![hash(n)],
        staker_proof_offsets: vec![0, 1],
    }
}

pub(crate) fn prune(n: u8) -> PruneParams {
    PruneParams {
        leaf_hash: hash(n),
        ancestor_hash: hash(CONFIRMED),
        leaf_proof: PathProof(vec![hash(n)]),
        anc_proof: PathProof::default(),
    }
}

pub(crate) fn moot(staker: Address) -> RecoverStakeMootedParams {
    RecoverStakeMootedParams {
        ancestor_hash: hash(CONFIRMED),
        addr: staker,
        lc_proof: PathProof::default(),
        st_proof: PathProof::default(),
    }
}

pub(crate) fn old(staker: Address) -> RecoverStakeOldParams {
    RecoverStakeOldParams {
        addr: staker,
        proof: PathProof::default(),
    }
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: BTreeMap<Buf32, Node>,
    positions: BTreeMap<Address, StakerPosition>,
    all_pairs: Vec<ChallengeOpportunity>,
    pairs: BTreeMap<(Address, Address), ChallengeOpportunity>,
    any: BTreeMap<Address, ChallengeOpportunity>,
}

/// A dispute graph whose query answers are scripted by the test.
#[derive(Debug, Default)]
pub(crate) struct MockGraph {
    state: Mutex<GraphState>,
    all_pairs_queries: AtomicUsize,
}

impl MockGraph {
    pub(crate) fn new() -> Self {
        let graph = Self::default();
        graph.insert_node(node(CONFIRMED, LinkType::Execution));
        graph.insert_node(node(KNOWN_VALID, LinkType::Execution));
        graph
    }

    pub(crate) fn insert_node(&self, node: Node) {
        self.state.lock().unwrap().nodes.insert(node.hash, node);
    }

    pub(crate) fn set_position(&self, staker: Address, location: u8) {
        self.state
            .lock()
            .unwrap()
            .positions
            .insert(staker, position(staker, location));
    }

    pub(crate) fn set_all_pairs(&self, opportunities: Vec<ChallengeOpportunity>) {
        self.state.lock().unwrap().all_pairs = opportunities;
    }

    /// Scripts a conflict between the foreign staker `target` and the local staker `me`.
    pub(crate) fn set_pair(&self, target: Address, me: Address, opp: ChallengeOpportunity) {
        self.state.lock().unwrap().pairs.insert((target, me), opp);
    }

    pub(crate) fn set_any(&self, target: Address, opp: ChallengeOpportunity) {
        self.state.lock().unwrap().any.insert(target, opp);
    }

    pub(crate) fn all_pairs_queries(&self) -> usize {
        self.all_pairs_queries.load(Ordering::SeqCst)
    }
}

impl DisputeGraph for MockGraph {
    fn latest_confirmed(&self) -> Buf32 {
        hash(CONFIRMED)
    }

    fn known_valid_node(&self) -> Buf32 {
        hash(KNOWN_VALID)
    }

    fn stake_requirement(&self) -> u128 {
        STAKE_REQUIREMENT
    }

    fn node_from_hash(&self, hash: &Buf32) -> Option<Node> {
        self.state.lock().unwrap().nodes.get(hash).cloned()
    }

    fn leaf_for(&self, position: &Buf32) -> Node {
        self.node_from_hash(position)
            .unwrap_or_else(|| node(KNOWN_VALID, LinkType::Execution))
    }

    fn position_of(&self, staker: &Address) -> Option<StakerPosition> {
        self.state.lock().unwrap().positions.get(staker).cloned()
    }

    fn challenge_opportunity_all_pairs(&self) -> Vec<ChallengeOpportunity> {
        self.all_pairs_queries.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().all_pairs.clone()
    }

    fn challenge_opportunity_pair(
        &self,
        a: &StakerPosition,
        b: &StakerPosition,
    ) -> Option<ChallengeOpportunity> {
        self.state
            .lock()
            .unwrap()
            .pairs
            .get(&(a.address, b.address))
            .cloned()
    }

    fn challenge_opportunity_any(&self, staker: &StakerPosition) -> Option<ChallengeOpportunity> {
        self.state.lock().unwrap().any.get(&staker.address).cloned()
    }

    fn pending_inbox(&self) -> PendingInbox {
        PendingInbox {
            top_hash: hash(80),
            count: 3,
        }
    }

    fn execution_precondition(&self, node: &Node) -> ExecutionPrecondition {
        ExecutionPrecondition {
            before_hash: node.machine_hash,
            time_bounds: TimeBounds {
                start_block: 1,
                end_block: 10,
            },
            before_inbox: hash(81),
        }
    }
}

/// A prover that can prove any path except those ending at a blocked node.
#[derive(Debug, Default)]
pub(crate) struct MockProver {
    blocked: Mutex<BTreeSet<Buf32>>,
}

impl MockProver {
    pub(crate) fn block(&self, to: Buf32) {
        self.blocked.lock().unwrap().insert(to);
    }

    pub(crate) fn unblock(&self, to: &Buf32) {
        self.blocked.lock().unwrap().remove(to);
    }
}

impl PathProver for Arc<MockProver> {
    fn path_proof(&self, from: &Buf32, to: &Buf32) -> Option<PathProof> {
        if self.blocked.lock().unwrap().contains(to) {
            return None;
        }
        Some(PathProof(vec![*from, *to]))
    }
}

/// A contract call as recorded by [`RecordingContract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    PlaceStake(u128),
    StartChallenge {
        asserter: Address,
        challenger: Address,
    },
    DefendPendingTop(Address),
    DefendMessages(Address),
    DefendExecution {
        challenge: Address,
        num_steps: u64,
    },
    ChallengePendingTop(Address),
    ChallengeMessages(Address),
    ChallengeExecution(Address),
    MakeAssertion(Buf32),
    ConfirmValid(Buf32),
    ConfirmInvalid(Buf32),
    PruneLeaf(Buf32),
    RecoverStakeMooted(Address),
    RecoverStakeOld(Address),
}

/// Calls made by every [`RecordingContract`] sharing this log.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    calls: Mutex<Vec<(Address, Call)>>,
    in_gate: AtomicUsize,
    max_in_gate: AtomicUsize,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl CallLog {
    pub(crate) fn with_delay(delay: Duration) -> Arc<Self> {
        let log = Self::default();
        log.set_delay(delay);
        Arc::new(log)
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<(Address, Call)> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than the initial stake placements.
    pub(crate) fn actions(&self) -> Vec<(Address, Call)> {
        self.calls()
            .into_iter()
            .filter(|(_, call)| !matches!(call, Call::PlaceStake(_)))
            .collect()
    }

    pub(crate) fn in_gate(&self) -> usize {
        self.in_gate.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_gate(&self) -> usize {
        self.max_in_gate.load(Ordering::SeqCst)
    }

    async fn record(&self, staker: Address, call: Call) -> ContractResult<()> {
        let _inside = InGate::enter(self);

        let delay = Duration::from_millis(self.delay_ms.load(Ordering::SeqCst));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().unwrap().push((staker, call));
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContractErr::Reverted("scripted failure".to_string()));
        }
        Ok(())
    }
}

/// Counts a call as running for as long as it is alive, including when it is cancelled.
struct InGate<'a>(&'a CallLog);

impl<'a> InGate<'a> {
    fn enter(log: &'a CallLog) -> Self {
        let now = log.in_gate.fetch_add(1, Ordering::SeqCst) + 1;
        log.max_in_gate.fetch_max(now, Ordering::SeqCst);
        Self(log)
    }
}

impl Drop for InGate<'_> {
    fn drop(&mut self) {
        self.0.in_gate.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A rollup contract binding that records every call in a shared [`CallLog`].
#[derive(Debug, Clone)]
pub(crate) struct RecordingContract {
    staker: Address,
    log: Arc<CallLog>,
}

impl RecordingContract {
    pub(crate) fn new(staker: Address, log: Arc<CallLog>) -> Self {
        Self { staker, log }
    }
}

#[async_trait]
impl RollupContract for RecordingContract {
    async fn place_stake(
        &self,
        amount: u128,
        _proof1: PathProof,
        _proof2: PathProof,
    ) -> ContractResult<()> {
        self.log.record(self.staker, Call::PlaceStake(amount)).await
    }

    async fn start_challenge(&self, opportunity: ChallengeOpportunity) -> ContractResult<()> {
        let call = Call::StartChallenge {
            asserter: opportunity.asserter,
            challenger: opportunity.challenger,
        };
        self.log.record(self.staker, call).await
    }

    async fn defend_pending_top(
        &self,
        challenge: Address,
        _inbox: PendingInbox,
        _node: Node,
    ) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::DefendPendingTop(challenge))
            .await
    }

    async fn defend_messages(
        &self,
        challenge: Address,
        _inbox: PendingInbox,
        _node: Node,
    ) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::DefendMessages(challenge))
            .await
    }

    async fn defend_execution(
        &self,
        challenge: Address,
        _machine: Buf32,
        _precondition: ExecutionPrecondition,
        num_steps: u64,
    ) -> ContractResult<()> {
        let call = Call::DefendExecution {
            challenge,
            num_steps,
        };
        self.log.record(self.staker, call).await
    }

    async fn challenge_pending_top(
        &self,
        challenge: Address,
        _inbox: PendingInbox,
    ) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::ChallengePendingTop(challenge))
            .await
    }

    async fn challenge_messages(
        &self,
        challenge: Address,
        _inbox: PendingInbox,
        _node: Node,
    ) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::ChallengeMessages(challenge))
            .await
    }

    async fn challenge_execution(
        &self,
        challenge: Address,
        _machine: Buf32,
        _precondition: ExecutionPrecondition,
    ) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::ChallengeExecution(challenge))
            .await
    }

    async fn make_assertion(
        &self,
        prepared: PreparedAssertion,
        _proof: PathProof,
    ) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::MakeAssertion(prepared.leaf_hash))
            .await
    }

    async fn confirm_valid(&self, params: ConfirmValidOpportunity) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::ConfirmValid(params.node_hash))
            .await
    }

    async fn confirm_invalid(&self, params: ConfirmInvalidOpportunity) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::ConfirmInvalid(params.node_hash))
            .await
    }

    async fn prune_leaf(&self, params: PruneParams) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::PruneLeaf(params.leaf_hash))
            .await
    }

    async fn recover_stake_mooted(&self, params: RecoverStakeMootedParams) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::RecoverStakeMooted(params.addr))
            .await
    }

    async fn recover_stake_old(&self, params: RecoverStakeOldParams) -> ContractResult<()> {
        self.log
            .record(self.staker, Call::RecoverStakeOld(params.addr))
            .await
    }
}

/// A ledger client handing out [`RecordingContract`]s that share one [`CallLog`].
#[derive(Debug, Clone)]
pub(crate) struct MockLedgerClient {
    log: Arc<CallLog>,
    fail_binding: bool,
}

impl MockLedgerClient {
    pub(crate) fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            fail_binding: false,
        }
    }

    pub(crate) fn failing(log: Arc<CallLog>) -> Self {
        Self {
            log,
            fail_binding: true,
        }
    }
}

impl LedgerClient for MockLedgerClient {
    type Contract = RecordingContract;

    fn bind_rollup(&self, rollup: Address, authority: &Authority) -> ContractResult<Self::Contract> {
        if self.fail_binding {
            return Err(ContractErr::Binding {
                rollup,
                reason: "no code at address".to_string(),
            });
        }
        Ok(RecordingContract::new(authority.from, self.log.clone()))
    }
}

pub(crate) type TestReactor = ProtocolReactor<MockGraph, Arc<MockProver>, RecordingContract>;

/// Everything a reactor test needs to script inputs and inspect outputs.
pub(crate) struct Harness {
    pub(crate) reactor: TestReactor,
    pub(crate) graph: Arc<MockGraph>,
    pub(crate) prover: Arc<MockProver>,
    pub(crate) log: Arc<CallLog>,
}

impl Harness {
    /// Builds a reactor with one local staker per entry of `locals`, all staked on the known valid
    /// node.
    pub(crate) fn with_stakers(locals: &[Address]) -> Self {
        logging::init(LoggerConfig::from_env("dispute-reactor-tests"));

        let graph = Arc::new(MockGraph::new());
        let prover = Arc::new(MockProver::default());
        let log = CallLog::with_delay(Duration::ZERO);
        let mut reactor = ProtocolReactor::new(
            ReactorConfig::new(addr(0xee)),
            graph.clone(),
            prover.clone(),
        );

        let client = MockLedgerClient::new(log.clone());
        for staker in locals {
            reactor
                .add_staker(&client, Authority::new(*staker))
                .unwrap();
            graph.set_position(*staker, KNOWN_VALID);
        }

        Self {
            reactor,
            graph,
            prover,
            log,
        }
    }

    /// Waits for every submission dispatched so far.
    pub(crate) async fn settle(&mut self) {
        self.reactor
            .drain_submissions(Duration::from_secs(5))
            .await
            .unwrap();
    }
}
