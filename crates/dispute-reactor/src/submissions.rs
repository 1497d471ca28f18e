//! Detached on-chain submissions and the best-effort record of those still in flight.

use std::{collections::VecDeque, fmt, future::Future, time::Duration};

use rollup_validator_primitives::buf::Address;
use tokio::{task::JoinHandle, time::timeout};
use tracing::{debug, error, info, warn};

use crate::errors::{ContractResult, ShutdownErr};

/// The contract call a submission performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionKind {
    /// Initial stake of a newly registered local staker.
    PlaceStake,

    /// Opening a challenge.
    InitiateChallenge,

    /// Defending a pending inbox top challenge.
    DefendPendingTop,

    /// Defending an imported messages challenge.
    DefendMessages,

    /// Defending an execution challenge.
    DefendExecution,

    /// Pursuing a pending inbox top challenge.
    ChallengePendingTop,

    /// Pursuing an imported messages challenge.
    ChallengeMessages,

    /// Pursuing an execution challenge.
    ChallengeExecution,

    /// Making an assertion.
    MakeAssertion,

    /// Confirming a valid node.
    ConfirmValid,

    /// Confirming the rejection of an invalid node.
    ConfirmInvalid,

    /// Pruning a dead leaf.
    PruneLeaf,

    /// Refunding a stake on a dead branch.
    RecoverStakeMooted,

    /// Refunding a stake on a long-confirmed node.
    RecoverStakeOld,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionKind::PlaceStake => "place-stake",
            SubmissionKind::InitiateChallenge => "initiate-challenge",
            SubmissionKind::DefendPendingTop => "defend-pending-top",
            SubmissionKind::DefendMessages => "defend-messages",
            SubmissionKind::DefendExecution => "defend-execution",
            SubmissionKind::ChallengePendingTop => "challenge-pending-top",
            SubmissionKind::ChallengeMessages => "challenge-messages",
            SubmissionKind::ChallengeExecution => "challenge-execution",
            SubmissionKind::MakeAssertion => "make-assertion",
            SubmissionKind::ConfirmValid => "confirm-valid",
            SubmissionKind::ConfirmInvalid => "confirm-invalid",
            SubmissionKind::PruneLeaf => "prune-leaf",
            SubmissionKind::RecoverStakeMooted => "recover-stake-mooted",
            SubmissionKind::RecoverStakeOld => "recover-stake-old",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
struct InFlight {
    kind: SubmissionKind,
    staker: Address,
    handle: JoinHandle<()>,
}

/// Spawns submissions and keeps their handles around for diagnostics.
///
/// Nothing on the event path ever waits on a handle. Handles of finished submissions are reaped
/// whenever a new one is spawned, and once more than `max_tracked` are in flight the oldest ones
/// are detached. Detaching never aborts the submission.
#[derive(Debug)]
pub struct SubmissionTracker {
    max_tracked: usize,
    in_flight: VecDeque<InFlight>,
}

impl SubmissionTracker {
    /// Creates a tracker retaining at most `max_tracked` handles.
    pub const fn new(max_tracked: usize) -> Self {
        Self {
            max_tracked,
            in_flight: VecDeque::new(),
        }
    }

    /// Runs `submission` on a detached task, logging its outcome.
    ///
    /// Failures are logged and dropped: the submission is not retried.
    pub fn spawn<F>(&mut self, kind: SubmissionKind, staker: Address, submission: F)
    where
        F: Future<Output = ContractResult<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            match submission.await {
                Ok(()) => info!(%staker, %kind, "submission succeeded"),
                Err(e) => error!(%staker, %kind, %e, "submission failed"),
            }
        });

        self.reap();
        self.in_flight.push_back(InFlight {
            kind,
            staker,
            handle,
        });

        while self.in_flight.len() > self.max_tracked {
            if let Some(detached) = self.in_flight.pop_front() {
                debug!(
                    staker = %detached.staker,
                    kind = %detached.kind,
                    "no longer tracking in-flight submission"
                );
            }
        }
    }

    /// Number of tracked submissions that have not finished yet.
    pub fn in_flight(&mut self) -> usize {
        self.reap();
        self.in_flight.len()
    }

    /// Waits for every tracked submission to finish, for at most `wait`.
    ///
    /// Submissions still running when the timeout elapses are left detached.
    pub async fn drain(&mut self, wait: Duration) -> Result<(), ShutdownErr> {
        let mut pending = std::mem::take(&mut self.in_flight);
        debug!(count = pending.len(), "waiting for in-flight submissions");

        let all_done = async {
            for sub in pending.iter_mut() {
                if let Err(e) = (&mut sub.handle).await {
                    error!(staker = %sub.staker, kind = %sub.kind, %e, "submission task failed");
                }
            }
        };
        let outcome = timeout(wait, all_done).await;

        match outcome {
            Ok(()) => Ok(()),
            Err(_) => {
                let remaining = pending
                    .iter()
                    .filter(|sub| !sub.handle.is_finished())
                    .count();
                warn!(%remaining, "timeout waiting for in-flight submissions");
                Err(ShutdownErr::ShutdownTimeout(remaining))
            }
        }
    }

    fn reap(&mut self) {
        self.in_flight.retain(|sub| !sub.handle.is_finished());
    }
}
